//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Map;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::{AccountLifecycleService, AccountQueryService, ServiceContext};
use crate::store::JsonFileStore;
use crate::traits::{
    AccountStore, ExternalAccountService, ExternalUser, NotificationSink, ServiceCoordinator,
};
use crate::types::{
    AccountForm, AccountRecord, DeleteForm, EngineSettings, Protocol, UriProfile,
    DEFAULT_ALTER_ID,
};
use crate::uri::UriGenerator;

pub const IDENTIFIER: &str = "0f8e7a2c-7c1b-4d7e-9a55-3f1f6a3f9b10";
pub const CREDENTIAL: &str = "6a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d";
pub const DEVICE_ID: &str = "d4c1a7b2-1e2f-4a3b-8c9d-0e1f2a3b4c5d";

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Record bound to [`DEVICE_ID`], valid through January 2024.
pub fn record(id: &str, password: &str, username: &str) -> AccountRecord {
    AccountRecord {
        id: id.to_string(),
        alter_id: (!id.is_empty()).then_some(DEFAULT_ALTER_ID),
        username: username.to_string(),
        device_id: DEVICE_ID.to_string(),
        start_date: day("2024-01-01"),
        expire_date: day("2024-02-01"),
        password: password.to_string(),
        extra: Map::new(),
    }
}

pub fn account_form(
    account_type: &str,
    identifier: &str,
    credential: &str,
    username: &str,
) -> AccountForm {
    AccountForm {
        account_type: account_type.to_string(),
        identifier: identifier.to_string(),
        credential: credential.to_string(),
        username: username.to_string(),
        device_id: DEVICE_ID.to_string(),
        start_date: "2024-01-01".to_string(),
        expire_date: "2024-02-01".to_string(),
        description: String::new(),
    }
}

pub fn delete_form(account_type: &str, identifier: &str, username: &str) -> DeleteForm {
    DeleteForm {
        account_type: account_type.to_string(),
        identifier: identifier.to_string(),
        device_id: DEVICE_ID.to_string(),
        username: username.to_string(),
    }
}

// ===== MockServiceCoordinator =====

pub struct MockServiceCoordinator {
    calls: AtomicUsize,
    /// 如果 Some，restart 时返回此错误
    failure: RwLock<Option<String>>,
}

impl MockServiceCoordinator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: RwLock::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write().await = reason.map(str::to_string);
    }
}

#[async_trait]
impl ServiceCoordinator for MockServiceCoordinator {
    async fn restart(&self) -> CoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.failure.read().await {
            Some(reason) => Err(CoreError::ExternalService {
                service: "v2ray".to_string(),
                detail: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ===== RecordingNotifier =====

pub struct RecordingNotifier {
    sent: RwLock<Vec<(String, String, u8)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
        }
    }

    pub async fn sent(&self) -> Vec<(String, String, u8)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str, priority: u8) {
        self.sent
            .write()
            .await
            .push((title.to_string(), message.to_string(), priority));
    }
}

// ===== MockExternalAccountService =====

pub struct MockExternalAccountService {
    users: RwLock<Vec<ExternalUser>>,
    /// 如果 Some，所有调用返回此错误
    failure: RwLock<Option<String>>,
}

impl MockExternalAccountService {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    pub async fn users(&self) -> Vec<ExternalUser> {
        self.users.read().await.clone()
    }

    pub async fn set_failure(&self, reason: Option<&str>) {
        *self.failure.write().await = reason.map(str::to_string);
    }

    async fn check(&self) -> CoreResult<()> {
        match &*self.failure.read().await {
            Some(reason) => Err(CoreError::ExternalService {
                service: "sstp".to_string(),
                detail: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExternalAccountService for MockExternalAccountService {
    async fn create_user(
        &self,
        username: &str,
        description: &str,
        _secret: &str,
        expiry: NaiveDate,
    ) -> CoreResult<String> {
        self.check().await?;
        self.users.write().await.push(ExternalUser {
            name: username.to_string(),
            note: description.to_string(),
            expires: Some(expiry.to_string()),
        });
        Ok(format!("created {username}"))
    }

    async fn delete_user(&self, username: &str) -> CoreResult<String> {
        self.check().await?;
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.name != username);
        if users.len() == before {
            return Err(CoreError::ExternalService {
                service: "sstp".to_string(),
                detail: format!("user {username} not found"),
            });
        }
        Ok(format!("deleted {username}"))
    }

    async fn list_users(&self) -> CoreResult<Vec<ExternalUser>> {
        self.check().await?;
        Ok(self.users().await)
    }
}

// ===== Factory =====

pub struct TestHarness {
    pub svc: AccountLifecycleService,
    pub query: AccountQueryService,
    pub store: Arc<JsonFileStore>,
    pub coordinator: Arc<MockServiceCoordinator>,
    pub notifier: Arc<RecordingNotifier>,
    pub external: Arc<MockExternalAccountService>,
    pub _dir: tempfile::TempDir,
}

/// Lifecycle and query services over empty collections in a temp directory.
pub async fn create_test_lifecycle(settings: EngineSettings) -> TestHarness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(
        dir.path().join("vmess.json"),
        dir.path().join("shadowsocks.json"),
    ));
    for protocol in Protocol::FILE_BACKED {
        store.initialize(protocol).await.unwrap();
    }

    let coordinator = Arc::new(MockServiceCoordinator::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let external = Arc::new(MockExternalAccountService::new());

    let ctx = Arc::new(ServiceContext::new(
        store.clone(),
        coordinator.clone(),
        notifier.clone(),
        external.clone(),
        settings,
    ));
    let uris = UriGenerator::new(UriProfile {
        host: "sg1.example.net".to_string(),
        ..UriProfile::default()
    });

    TestHarness {
        svc: AccountLifecycleService::new(Arc::clone(&ctx)),
        query: AccountQueryService::new(ctx, uris),
        store,
        coordinator,
        notifier,
        external,
        _dir: dir,
    }
}
