//! Read-only account queries for the console views

use std::sync::Arc;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::ExternalUser;
use crate::types::{AccountRecord, AccountSummary, ConnectionInfo, LookupKey, Protocol};
use crate::uri::UriGenerator;
use crate::utils::log_sanitizer::last_chars;

/// Accounts of one protocol, from whichever backend owns them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "backend", content = "accounts", rename_all = "lowercase")]
pub enum AccountListing {
    Collection(Vec<AccountRecord>),
    External(Vec<ExternalUser>),
}

impl AccountListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Collection(records) => records.len(),
            Self::External(users) => users.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 账户查询服务
pub struct AccountQueryService {
    ctx: Arc<ServiceContext>,
    uris: UriGenerator,
}

impl AccountQueryService {
    /// 创建账户查询服务实例
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, uris: UriGenerator) -> Self {
        Self { ctx, uris }
    }

    /// List the accounts of a protocol
    pub async fn list(&self, protocol: Protocol) -> CoreResult<AccountListing> {
        if protocol.is_file_backed() {
            let collection = self.ctx.store().load(protocol).await?;
            Ok(AccountListing::Collection(collection.records))
        } else {
            Ok(AccountListing::External(
                self.ctx.external().list_users().await?,
            ))
        }
    }

    /// Find one record by its protocol key
    pub async fn find(&self, protocol: Protocol, key: &str) -> CoreResult<AccountRecord> {
        let lookup = protocol
            .key_for(key)
            .ok_or_else(|| CoreError::UnsupportedProtocol {
                protocol: protocol.to_string(),
                operation: "account lookup".to_string(),
            })?;
        let collection = self.ctx.store().load(protocol).await?;
        collection
            .find(&lookup)
            .cloned()
            .ok_or_else(|| not_found(protocol, &lookup))
    }

    /// Plain and device-locked connection strings for one record
    pub async fn connection_info(
        &self,
        protocol: Protocol,
        key: &str,
    ) -> CoreResult<ConnectionInfo> {
        let record = self.find(protocol, key).await?;
        let plain = self.uris.generate_uri(&record, protocol)?;
        let locked = self.uris.generate_locked_uri(&record, protocol)?;

        Ok(ConnectionInfo {
            display_name: record.username.clone(),
            locked_display_name: format!(
                "{} {}",
                record.username,
                last_chars(&record.device_id, 4)
            ),
            plain,
            locked,
        })
    }

    /// Per-protocol account counts. An unreadable backend counts as zero.
    pub async fn summary(&self) -> AccountSummary {
        let mut summary = AccountSummary::default();
        for protocol in Protocol::ALL {
            let count = match self.list(protocol).await {
                Ok(listing) => listing.len(),
                Err(e) => {
                    log::warn!("[{protocol}] Failed to count accounts: {e}");
                    0
                }
            };
            match protocol {
                Protocol::Vmess => summary.vmess = count,
                Protocol::Shadowsocks => summary.shadowsocks = count,
                Protocol::Sstp => summary.sstp = count,
            }
        }
        summary
    }
}

fn not_found(protocol: Protocol, key: &LookupKey) -> CoreError {
    CoreError::NotFound {
        protocol: protocol.to_string(),
        key: key.to_string(),
    }
}
