//! Concrete collaborators for the account engine.

mod command_coordinator;
mod gotify;
mod http;
mod softether;

pub use command_coordinator::CommandServiceCoordinator;
pub use gotify::GotifyNotifier;
pub use http::HttpUtils;
pub use softether::{SoftEtherClient, UnconfiguredExternalService};
