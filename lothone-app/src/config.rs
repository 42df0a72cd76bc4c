//! Application configuration
//!
//! Loaded from a TOML file. Every section and field is optional and falls back
//! to the console's historical command-line defaults.

use std::path::{Path, PathBuf};

use lothone_core::types::{DuplicatePolicy, EditMissPolicy, EngineSettings, UriProfile};
use lothone_core::Protocol;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {detail}")]
    Io { path: String, detail: String },

    #[error("Failed to parse config file {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub deployment: DeploymentConfig,
    pub storage: StorageConfig,
    pub service: ServiceConfig,
    pub notification: NotificationConfig,
    pub sstp: SstpConfig,
    pub engine: EngineConfig,
    pub uri: UriConfig,
}

/// `[deployment]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Public host name; its first label prefixes URI remarks
    pub web_host: String,
    /// Public address shown in notifications
    pub host_ip: String,
    /// Port clients connect to
    pub proxy_port: u16,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            web_host: "127.0.0.1".to_string(),
            host_ip: "127.0.0.1".to_string(),
            proxy_port: 443,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub vmess_file: String,
    pub shadowsocks_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            vmess_file: "vmess-users.json".to_string(),
            shadowsocks_file: "shadowsocks-users.json".to_string(),
        }
    }
}

/// `[service]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Program and arguments that restart the proxy daemon
    pub restart_command: Vec<String>,
    /// Upper bound for one restart. Unset waits for the command to exit.
    pub restart_timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            restart_command: ["systemctl", "restart", "v2ray"]
                .map(String::from)
                .to_vec(),
            restart_timeout_secs: None,
        }
    }
}

/// `[notification]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub gotify_server: String,
    /// One message is posted per key. No keys means log-only notifications.
    pub gotify_api_keys: Vec<String>,
    pub priority: u8,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            gotify_server: "noti.localhost:11111".to_string(),
            gotify_api_keys: Vec::new(),
            priority: 5,
        }
    }
}

/// `[sstp]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SstpConfig {
    /// JSON-RPC endpoint of the admin API. Unset disables SSTP operations.
    pub endpoint: Option<String>,
    pub hub: String,
    pub admin_password: String,
}

impl Default for SstpConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            hub: "DEFAULT".to_string(),
            admin_password: String::new(),
        }
    }
}

/// `[engine]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub edit_miss: EditMissPolicy,
    pub duplicates: DuplicatePolicy,
}

/// `[uri]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UriConfig {
    pub vmess_network: String,
    pub vmess_path: String,
    pub vmess_tls: bool,
    pub shadowsocks_method: String,
}

impl Default for UriConfig {
    fn default() -> Self {
        let profile = UriProfile::default();
        Self {
            vmess_network: profile.vmess_network,
            vmess_path: profile.vmess_path,
            vmess_tls: profile.vmess_tls,
            shadowsocks_method: profile.shadowsocks_method,
        }
    }
}

impl AppConfig {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { detail, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                detail,
            },
            other => other,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.proxy_port == 0 {
            return Err(ConfigError::invalid("deployment.proxy_port", "must be non-zero"));
        }
        if self
            .service
            .restart_command
            .first()
            .is_none_or(|program| program.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "service.restart_command",
                "must name a program",
            ));
        }
        if self.service.restart_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "service.restart_timeout_secs",
                "must be positive when set",
            ));
        }
        if self.storage.vmess_file == self.storage.shadowsocks_file {
            return Err(ConfigError::invalid(
                "storage.shadowsocks_file",
                "must differ from storage.vmess_file",
            ));
        }
        Ok(())
    }

    /// Collection file of a file-backed protocol; `None` for SSTP.
    pub fn collection_path(&self, protocol: Protocol) -> Option<PathBuf> {
        let file = match protocol {
            Protocol::Vmess => &self.storage.vmess_file,
            Protocol::Shadowsocks => &self.storage.shadowsocks_file,
            Protocol::Sstp => return None,
        };
        Some(self.storage.data_dir.join(file))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            host_name: self.deployment.web_host.clone(),
            host_ip: self.deployment.host_ip.clone(),
            edit_miss: self.engine.edit_miss,
            duplicates: self.engine.duplicates,
            notification_priority: self.notification.priority,
        }
    }

    pub fn uri_profile(&self) -> UriProfile {
        UriProfile {
            host: self.deployment.web_host.clone(),
            port: self.deployment.proxy_port,
            vmess_network: self.uri.vmess_network.clone(),
            vmess_path: self.uri.vmess_path.clone(),
            vmess_tls: self.uri.vmess_tls,
            shadowsocks_method: self.uri.shadowsocks_method.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.deployment.proxy_port, 443);
        assert_eq!(config.notification.priority, 5);
        assert_eq!(config.service.restart_timeout_secs, None);
        assert_eq!(config.engine.edit_miss, EditMissPolicy::Succeed);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [deployment]
            web_host = "sg1.example.net"
            host_ip = "203.0.113.9"

            [storage]
            data_dir = "/var/lib/lothone"

            [service]
            restart_command = ["sv", "restart", "xray"]
            restart_timeout_secs = 30

            [engine]
            edit_miss = "not_found"
            duplicates = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine_settings().host_name, "sg1.example.net");
        assert_eq!(config.engine.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.service.restart_timeout_secs, Some(30));
        assert_eq!(
            config.collection_path(Protocol::Vmess).unwrap(),
            PathBuf::from("/var/lib/lothone/vmess-users.json")
        );
        assert!(config.collection_path(Protocol::Sstp).is_none());
        assert_eq!(config.uri_profile().host, "sg1.example.net");
    }

    #[test]
    fn invalid_values_rejected() {
        let err = AppConfig::from_toml_str("[service]\nrestart_command = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "service.restart_command"));

        let err = AppConfig::from_toml_str("[deployment]\nproxy_port = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = AppConfig::from_toml_str("[engine]\nedit_miss = \"maybe\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lothone.toml");
        std::fs::write(&path, "[deployment\n").unwrap();
        match AppConfig::load(&path).unwrap_err() {
            ConfigError::Parse { path: p, .. } => assert!(p.ends_with("lothone.toml")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            AppConfig::load(&dir.path().join("missing.toml")).unwrap_err(),
            ConfigError::Io { .. }
        ));
    }
}
