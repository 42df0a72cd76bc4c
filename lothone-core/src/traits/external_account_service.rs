//! External SSTP admin service abstract Trait

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Account as reported by the external service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUser {
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub expires: Option<String>,
}

/// Out-of-process account backend for the SSTP protocol family.
///
/// The engine does not own this data; every call is a black box returning the
/// service's raw response text.
#[async_trait]
pub trait ExternalAccountService: Send + Sync {
    /// Create a user
    ///
    /// # Arguments
    /// * `username` - Account name (never contains `/`)
    /// * `description` - Free-text note
    /// * `secret` - Password
    /// * `expiry` - Last valid day
    async fn create_user(
        &self,
        username: &str,
        description: &str,
        secret: &str,
        expiry: NaiveDate,
    ) -> CoreResult<String>;

    /// Delete a user by name
    async fn delete_user(&self, username: &str) -> CoreResult<String>;

    /// List all users
    async fn list_users(&self) -> CoreResult<Vec<ExternalUser>>;
}
