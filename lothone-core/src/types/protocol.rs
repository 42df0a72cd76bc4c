//! Protocol family and lookup key definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::utils::log_sanitizer::mask_secret;

use super::AccountRecord;

/// Supported account backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// UUID-identified proxy protocol, keyed by `id`
    Vmess,
    /// Credential-identified proxy protocol, keyed by `password`
    Shadowsocks,
    /// Externally-serviced protocol, accounts live in the SSTP admin service
    Sstp,
}

impl Protocol {
    /// All protocol families, in dashboard order
    pub const ALL: [Self; 3] = [Self::Vmess, Self::Shadowsocks, Self::Sstp];

    /// Protocols whose accounts are persisted in a collection file
    pub const FILE_BACKED: [Self; 2] = [Self::Vmess, Self::Shadowsocks];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vmess => "vmess",
            Self::Shadowsocks => "shadowsocks",
            Self::Sstp => "sstp",
        }
    }

    pub fn is_file_backed(self) -> bool {
        !matches!(self, Self::Sstp)
    }

    /// Wraps a raw key string in the lookup case this protocol is addressed by.
    ///
    /// Returns `None` for SSTP, which has no collection.
    pub fn key_for(self, raw: impl Into<String>) -> Option<LookupKey> {
        match self {
            Self::Vmess => Some(LookupKey::Identifier(raw.into())),
            Self::Shadowsocks => Some(LookupKey::Credential(raw.into())),
            Self::Sstp => None,
        }
    }

    /// Lookup key addressing `record` within this protocol's collection.
    pub fn lookup_key(self, record: &AccountRecord) -> Option<LookupKey> {
        match self {
            Self::Vmess => self.key_for(record.id.clone()),
            Self::Shadowsocks => self.key_for(record.password.clone()),
            Self::Sstp => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vmess" => Ok(Self::Vmess),
            "shadowsocks" => Ok(Self::Shadowsocks),
            "sstp" => Ok(Self::Sstp),
            other => Err(CoreError::validation(
                "type",
                format!("unknown account type '{other}'"),
            )),
        }
    }
}

/// Dual-key lookup. Exactly one case is populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LookupKey {
    /// Matches `AccountRecord::id`
    Identifier(String),
    /// Matches `AccountRecord::password`
    Credential(String),
}

impl LookupKey {
    pub fn matches(&self, record: &AccountRecord) -> bool {
        match self {
            Self::Identifier(id) => record.id == *id,
            Self::Credential(password) => record.password == *password,
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(v) => write!(f, "id={v}"),
            Self::Credential(v) => write!(f, "credential={}", mask_secret(v)),
        }
    }
}
