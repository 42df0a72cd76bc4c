//! Account collection persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{AccountCollection, AccountRecord, Protocol};

/// In-memory edit applied to a freshly loaded collection.
///
/// Returns the record the edit affected (replaced or removed), if any. An
/// `Err` discards the edit and is handed back to the caller untouched.
pub type CollectionMutation =
    Box<dyn FnOnce(&mut AccountCollection) -> CoreResult<Option<AccountRecord>> + Send>;

/// Account Collection Store Trait
///
/// Implementation:
/// - `JsonFileStore`: one JSON file per file-backed protocol
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load the current collection of a protocol
    ///
    /// # Arguments
    /// * `protocol` - File-backed protocol
    async fn load(&self, protocol: Protocol) -> CoreResult<AccountCollection>;

    /// Run one read-modify-write cycle under the protocol's mutation lock
    ///
    /// The collection is persisted only when `mutation` succeeds.
    ///
    /// # Arguments
    /// * `protocol` - File-backed protocol
    /// * `mutation` - Edit to apply
    async fn mutate(
        &self,
        protocol: Protocol,
        mutation: CollectionMutation,
    ) -> CoreResult<Option<AccountRecord>>;

    /// Create an empty collection if none exists
    ///
    /// # Returns
    /// * `Ok(true)` - A new collection was written
    /// * `Ok(false)` - A collection already existed and was left alone
    async fn initialize(&self, protocol: Protocol) -> CoreResult<bool>;
}
