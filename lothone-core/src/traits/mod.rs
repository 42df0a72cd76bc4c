//! Storage and collaborator abstraction trait definition

mod account_store;
mod external_account_service;
mod notification_sink;
mod service_coordinator;

pub use account_store::{AccountStore, CollectionMutation};
pub use external_account_service::{ExternalAccountService, ExternalUser};
pub use notification_sink::{LogNotificationSink, NotificationSink};
pub use service_coordinator::ServiceCoordinator;
