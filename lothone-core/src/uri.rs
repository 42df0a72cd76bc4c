//! Connection URI generator
//!
//! Builds the strings the client apps import: a plain URI, and a locked URI
//! that binds the plain one to the record's device identifier.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{AccountRecord, ConnectionUri, Protocol, UriProfile};
use crate::utils::log_sanitizer::last_chars;

pub const VMESS_PREFIX: &str = "vmess://";
pub const SHADOWSOCKS_PREFIX: &str = "shadowsocks://";
pub const LOCKED_PREFIX: &str = "v2box://locked=";

/// VMess share object. Field order is fixed so output is byte-stable.
#[derive(Serialize)]
struct VmessShare<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: String,
    id: &'a str,
    aid: String,
    scy: &'static str,
    net: &'a str,
    #[serde(rename = "type")]
    header_type: &'static str,
    host: &'a str,
    path: &'a str,
    tls: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LockedPayload<'a> {
    device_id: &'a str,
    uri: &'a str,
}

pub struct UriGenerator {
    profile: UriProfile,
}

impl UriGenerator {
    #[must_use]
    pub fn new(profile: UriProfile) -> Self {
        Self { profile }
    }

    /// Host label plus the last four characters of the protocol secret.
    fn remarks(&self, secret: &str) -> String {
        let label = self.profile.host.split('.').next().unwrap_or_default();
        format!("{label} {}", last_chars(secret, 4))
    }

    fn unsupported(protocol: Protocol) -> CoreError {
        CoreError::UnsupportedProtocol {
            protocol: protocol.to_string(),
            operation: "uri generation".to_string(),
        }
    }

    /// Plain connection string, usable from any device.
    pub fn generate_uri(
        &self,
        record: &AccountRecord,
        protocol: Protocol,
    ) -> CoreResult<ConnectionUri> {
        let (uri, remarks) = match protocol {
            Protocol::Vmess => {
                let remarks = self.remarks(&record.id);
                (self.vmess_uri(record, &remarks)?, remarks)
            }
            Protocol::Shadowsocks => {
                let remarks = self.remarks(&record.password);
                (self.shadowsocks_uri(record, &remarks), remarks)
            }
            Protocol::Sstp => return Err(Self::unsupported(protocol)),
        };
        Ok(ConnectionUri { uri, remarks })
    }

    /// Connection string that only works from `record.device_id`.
    pub fn generate_locked_uri(
        &self,
        record: &AccountRecord,
        protocol: Protocol,
    ) -> CoreResult<ConnectionUri> {
        let plain = self.generate_uri(record, protocol)?;
        let payload = serde_json::to_vec(&LockedPayload {
            device_id: &record.device_id,
            uri: &plain.uri,
        })
        .map_err(|e| CoreError::Serialization(e.to_string()))?;

        Ok(ConnectionUri {
            uri: format!("{LOCKED_PREFIX}{}", STANDARD.encode(payload)),
            remarks: plain.remarks,
        })
    }

    fn vmess_uri(&self, record: &AccountRecord, remarks: &str) -> CoreResult<String> {
        let share = VmessShare {
            v: "2",
            ps: remarks,
            add: &self.profile.host,
            port: self.profile.port.to_string(),
            id: &record.id,
            aid: record.alter_id.unwrap_or_default().to_string(),
            scy: "auto",
            net: &self.profile.vmess_network,
            header_type: "none",
            host: &self.profile.host,
            path: &self.profile.vmess_path,
            tls: if self.profile.vmess_tls { "tls" } else { "" },
        };
        let json = serde_json::to_vec(&share).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(format!("{VMESS_PREFIX}{}", STANDARD.encode(json)))
    }

    fn shadowsocks_uri(&self, record: &AccountRecord, remarks: &str) -> String {
        let user_info = STANDARD.encode(format!(
            "{}:{}",
            self.profile.shadowsocks_method, record.password
        ));
        format!(
            "{SHADOWSOCKS_PREFIX}{user_info}@{}:{}#{}",
            self.profile.host,
            self.profile.port,
            urlencoding::encode(remarks)
        )
    }
}
