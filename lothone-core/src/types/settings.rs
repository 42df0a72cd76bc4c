//! Engine and URI settings

use serde::{Deserialize, Serialize};

/// What an edit does when its key matches no record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMissPolicy {
    /// Report success with no previous record (historical console behaviour)
    #[default]
    Succeed,
    /// Fail with `NotFound`
    NotFound,
}

/// Whether create re-checks the protocol key for uniqueness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Allow,
    /// Fail with `Conflict`
    Reject,
}

/// Lifecycle engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Deployment host name, used in notification titles
    pub host_name: String,
    /// Deployment host address, used in notification messages
    pub host_ip: String,
    pub edit_miss: EditMissPolicy,
    pub duplicates: DuplicatePolicy,
    pub notification_priority: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            host_name: "127.0.0.1".to_string(),
            host_ip: "127.0.0.1".to_string(),
            edit_miss: EditMissPolicy::default(),
            duplicates: DuplicatePolicy::default(),
            notification_priority: 5,
        }
    }
}

/// Parameters of generated connection strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UriProfile {
    /// Host clients connect to; its first label is the remarks prefix
    pub host: String,
    pub port: u16,
    /// VMess transport (`tcp`, `ws`, ...)
    pub vmess_network: String,
    pub vmess_path: String,
    pub vmess_tls: bool,
    pub shadowsocks_method: String,
}

impl Default for UriProfile {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 443,
            vmess_network: "ws".to_string(),
            vmess_path: "/".to_string(),
            vmess_tls: true,
            shadowsocks_method: "chacha20-ietf-poly1305".to_string(),
        }
    }
}
