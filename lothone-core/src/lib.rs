//! LoThone Core Library
//!
//! Account mutation engine behind the LoThone operator console:
//! - Record codec and JSON collection store (VMess / Shadowsocks)
//! - Credential validation and connection URI generation
//! - Account lifecycle engine (create / edit / delete) with service restart
//!   and notification side effects
//!
//! The engine is platform-independent. Side-effecting collaborators (service
//! supervisor, notification transport, external SSTP admin service) are
//! abstracted through traits and injected by the application layer.

pub mod codec;
pub mod error;
pub mod services;
pub mod store;
pub mod traits;
pub mod types;
pub mod uri;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult, ErrorClass};
pub use services::{AccountLifecycleService, AccountListing, AccountQueryService, ServiceContext};
pub use store::JsonFileStore;
pub use traits::{AccountStore, ExternalAccountService, NotificationSink, ServiceCoordinator};
pub use types::{AccountCollection, AccountRecord, LookupKey, Protocol};
