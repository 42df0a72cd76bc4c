//! 业务逻辑服务层

mod account_lifecycle_service;
mod account_query_service;

pub use account_lifecycle_service::{AccountLifecycleService, LifecycleStage};
pub use account_query_service::{AccountListing, AccountQueryService};

use std::sync::Arc;

use crate::traits::{AccountStore, ExternalAccountService, NotificationSink, ServiceCoordinator};
use crate::types::EngineSettings;

/// 服务上下文 - 持有所有依赖
///
/// The application layer creates this context and injects the concrete store
/// and collaborator implementations.
pub struct ServiceContext {
    store: Arc<dyn AccountStore>,
    coordinator: Arc<dyn ServiceCoordinator>,
    notifier: Arc<dyn NotificationSink>,
    external: Arc<dyn ExternalAccountService>,
    settings: EngineSettings,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        coordinator: Arc<dyn ServiceCoordinator>,
        notifier: Arc<dyn NotificationSink>,
        external: Arc<dyn ExternalAccountService>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            coordinator,
            notifier,
            external,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<dyn ServiceCoordinator> {
        &self.coordinator
    }

    pub fn notifier(&self) -> &Arc<dyn NotificationSink> {
        &self.notifier
    }

    pub fn external(&self) -> &Arc<dyn ExternalAccountService> {
        &self.external
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
