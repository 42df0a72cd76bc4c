//! Result types returned to the HTTP layer

use serde::{Deserialize, Serialize};

use super::{AccountRecord, Operation, Protocol};

/// Result of the restart phase that follows a committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RestartOutcome {
    /// No restart for this operation/protocol
    Skipped,
    Succeeded,
    /// The mutation stays committed
    Failed { reason: String },
}

/// Two-phase result of one lifecycle pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOutcome {
    pub operation: Operation,
    pub protocol: Protocol,
    /// Created record, edited record, or removed record
    pub record: Option<AccountRecord>,
    /// Replaced record on edit; `None` when the edit matched nothing
    pub previous: Option<AccountRecord>,
    pub persisted: bool,
    pub restart: RestartOutcome,
}

impl AccountOutcome {
    pub fn restarted(&self) -> bool {
        matches!(self.restart, RestartOutcome::Succeeded)
    }

    /// Saved, but the dependent service did not come back
    pub fn is_degraded(&self) -> bool {
        self.persisted && matches!(self.restart, RestartOutcome::Failed { .. })
    }
}

/// A generated client connection string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionUri {
    pub uri: String,
    /// Display-only label: host label + last four characters of the secret
    pub remarks: String,
}

/// Plain and device-locked connection strings for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub display_name: String,
    pub locked_display_name: String,
    pub plain: ConnectionUri,
    pub locked: ConnectionUri,
}

/// Per-protocol account counts for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub vmess: usize,
    pub shadowsocks: usize,
    pub sstp: usize,
}

impl AccountSummary {
    pub fn total(&self) -> usize {
        self.vmess + self.shadowsocks + self.sstp
    }
}
