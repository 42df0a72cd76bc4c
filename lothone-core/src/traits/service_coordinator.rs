//! Proxy daemon supervisor abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;

/// Restarts the proxy daemon that reads the collection files.
#[async_trait]
pub trait ServiceCoordinator: Send + Sync {
    /// Restart the dependent service
    ///
    /// A failure here never undoes an already committed mutation.
    async fn restart(&self) -> CoreResult<()>;
}
