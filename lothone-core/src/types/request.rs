//! Request types flowing from the HTTP layer into the lifecycle engine

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AccountRecord, LookupKey, Protocol};

/// Caller metadata for one authenticated request.
///
/// Authentication and CSRF checks happen upstream; the engine only uses the
/// actor address in notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Remote address of the operator
    pub actor: String,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }
}

/// Raw create/edit form as submitted by the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountForm {
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(alias = "serverId")]
    pub identifier: String,
    #[serde(alias = "password")]
    pub credential: String,
    pub username: String,
    pub device_id: String,
    pub start_date: String,
    #[serde(alias = "endDate")]
    pub expire_date: String,
    /// SSTP user note
    #[serde(alias = "desc")]
    pub description: String,
}

/// Raw delete form as submitted by the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteForm {
    #[serde(rename = "type")]
    pub account_type: String,
    /// Protocol key (id for VMess, credential for Shadowsocks)
    #[serde(alias = "serverId")]
    pub identifier: String,
    pub device_id: String,
    /// SSTP account name
    pub username: String,
}

/// Normalized create/edit candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAccount {
    pub protocol: Protocol,
    pub record: AccountRecord,
    pub description: String,
}

/// What a delete request addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A record in a collection file, guarded by its device id
    Record { key: LookupKey, device_id: String },
    /// An account held by the external SSTP service
    ExternalUser { username: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDelete {
    pub protocol: Protocol,
    pub target: DeleteTarget,
}

/// A validated mutation intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    Create(ValidatedAccount),
    Edit(ValidatedAccount),
    Delete(ValidatedDelete),
}

impl MutationRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create(_) => Operation::Create,
            Self::Edit(_) => Operation::Edit,
            Self::Delete(_) => Operation::Delete,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Create(a) | Self::Edit(a) => a.protocol,
            Self::Delete(d) => d.protocol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Edit,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        })
    }
}
