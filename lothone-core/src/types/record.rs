//! Account record and collection definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::LookupKey;

/// Username stored when the operator leaves the name as `-`
pub const DEFAULT_USERNAME: &str = "unknown/admin";

/// Numeric option written for VMess clients
pub const DEFAULT_ALTER_ID: u32 = 1;

/// One client account as persisted in a collection file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Identifier (UUID), primary key for VMess
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// VMess alter id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u32>,
    /// Free-text label
    #[serde(default)]
    pub username: String,
    /// Device the locked URI is bound to (UUID)
    #[serde(default)]
    pub device_id: String,
    #[serde(with = "crate::utils::date")]
    pub start_date: NaiveDate,
    #[serde(with = "crate::utils::date")]
    pub expire_date: NaiveDate,
    /// Secondary credential (UUID), primary key for Shadowsocks
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Per-client keys the console does not manage (`email`, `level`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full set of records for one protocol; the unit of a write.
///
/// Top-level keys other than `clients` are carried through untouched so the
/// collection file may also hold daemon settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountCollection {
    #[serde(rename = "clients", default)]
    pub records: Vec<AccountRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountCollection {
    pub fn new(records: Vec<AccountRecord>) -> Self {
        Self {
            records,
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, key: &LookupKey) -> Option<usize> {
        self.records.iter().position(|r| key.matches(r))
    }

    pub fn find(&self, key: &LookupKey) -> Option<&AccountRecord> {
        self.records.iter().find(|r| key.matches(r))
    }

    pub fn contains(&self, key: &LookupKey) -> bool {
        self.position(key).is_some()
    }

    pub fn push(&mut self, record: AccountRecord) {
        self.records.push(record);
    }

    /// Replaces the first record matching `key` in place, returning the old one.
    ///
    /// Unmanaged keys of the old record are kept unless `record` sets them.
    pub fn replace(&mut self, key: &LookupKey, mut record: AccountRecord) -> Option<AccountRecord> {
        let idx = self.position(key)?;
        for (name, value) in &self.records[idx].extra {
            record
                .extra
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        Some(std::mem::replace(&mut self.records[idx], record))
    }

    /// Removes the first record matching both `key` and `device_id`.
    pub fn remove(&mut self, key: &LookupKey, device_id: &str) -> Option<AccountRecord> {
        let idx = self
            .records
            .iter()
            .position(|r| key.matches(r) && r.device_id == device_id)?;
        Some(self.records.remove(idx))
    }
}
