//! Application bootstrap for the LoThone account engine.
//!
//! Provides `AppConfig` (TOML configuration), `AppState` (service container),
//! `AppStateBuilder` (adapter injection) and the concrete adapters for the
//! proxy supervisor, Gotify and the SSTP admin API.

pub mod adapters;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use lothone_core::error::{CoreError, CoreResult};
use lothone_core::services::{AccountLifecycleService, AccountQueryService, ServiceContext};
use lothone_core::traits::{
    AccountStore, ExternalAccountService, LogNotificationSink, NotificationSink,
    ServiceCoordinator,
};
use lothone_core::types::{EngineSettings, UriProfile};
use lothone_core::uri::UriGenerator;
use lothone_core::{JsonFileStore, Protocol};

use adapters::{CommandServiceCoordinator, GotifyNotifier, SoftEtherClient, UnconfiguredExternalService};
use config::AppConfig;

/// Application state.
///
/// Holds the `ServiceContext` and the services built on it. Every frontend
/// constructs this once at startup via `AppStateBuilder` or `from_config`.
pub struct AppState {
    /// Service context (holds all adapters)
    pub ctx: Arc<ServiceContext>,
    /// Create / edit / delete
    pub lifecycle_service: Arc<AccountLifecycleService>,
    /// Listing, lookup, connection strings, dashboard counts
    pub query_service: Arc<AccountQueryService>,
}

impl AppState {
    /// Wire the production adapters described by `config`.
    pub fn from_config(config: &AppConfig) -> CoreResult<Self> {
        let storage = &config.storage;
        let store = JsonFileStore::new(
            storage.data_dir.join(&storage.vmess_file),
            storage.data_dir.join(&storage.shadowsocks_file),
        );

        let coordinator = CommandServiceCoordinator::new(
            &config.service.restart_command,
            config.service.restart_timeout_secs.map(Duration::from_secs),
        )?;

        let notification = &config.notification;
        let notifier: Arc<dyn NotificationSink> = if notification.gotify_api_keys.is_empty() {
            log::info!("No Gotify keys configured, notifications go to the log only");
            Arc::new(LogNotificationSink)
        } else {
            Arc::new(GotifyNotifier::new(
                &notification.gotify_server,
                notification.gotify_api_keys.clone(),
            )?)
        };

        let sstp = &config.sstp;
        let external: Arc<dyn ExternalAccountService> = match sstp.endpoint.as_deref() {
            Some(endpoint) => Arc::new(SoftEtherClient::new(
                endpoint,
                &sstp.hub,
                &sstp.admin_password,
            )?),
            None => {
                log::info!("No SSTP endpoint configured, SSTP operations are disabled");
                Arc::new(UnconfiguredExternalService)
            }
        };

        AppStateBuilder::new()
            .store(Arc::new(store))
            .coordinator(Arc::new(coordinator))
            .notifier(notifier)
            .external(external)
            .settings(config.engine_settings())
            .uri_profile(config.uri_profile())
            .build()
    }

    /// Create missing collection files. Existing files are left alone.
    ///
    /// Returns, per file-backed protocol, whether a file was created.
    pub async fn initialize_collections(&self) -> CoreResult<Vec<(Protocol, bool)>> {
        let mut created = Vec::with_capacity(Protocol::FILE_BACKED.len());
        for protocol in Protocol::FILE_BACKED {
            created.push((protocol, self.ctx.store().initialize(protocol).await?));
        }
        Ok(created)
    }
}

/// Builder for constructing `AppState` with injected adapters.
///
/// # Required adapters
/// - `store`: where collections are persisted
/// - `coordinator`: how the proxy daemon is restarted
///
/// # Optional
/// - `notifier`: defaults to `LogNotificationSink`
/// - `external`: defaults to `UnconfiguredExternalService`
/// - `settings` / `uri_profile`: default values
pub struct AppStateBuilder {
    store: Option<Arc<dyn AccountStore>>,
    coordinator: Option<Arc<dyn ServiceCoordinator>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    external: Option<Arc<dyn ExternalAccountService>>,
    settings: EngineSettings,
    uri_profile: UriProfile,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            coordinator: None,
            notifier: None,
            external: None,
            settings: EngineSettings::default(),
            uri_profile: UriProfile::default(),
        }
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn coordinator(mut self, coordinator: Arc<dyn ServiceCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn external(mut self, external: Arc<dyn ExternalAccountService>) -> Self {
        self.external = Some(external);
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn uri_profile(mut self, profile: UriProfile) -> Self {
        self.uri_profile = profile;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::Validation` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let store = self
            .store
            .ok_or_else(|| CoreError::validation("store", "is required"))?;
        let coordinator = self
            .coordinator
            .ok_or_else(|| CoreError::validation("coordinator", "is required"))?;
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LogNotificationSink));
        let external = self
            .external
            .unwrap_or_else(|| Arc::new(UnconfiguredExternalService));

        let ctx = Arc::new(ServiceContext::new(
            store,
            coordinator,
            notifier,
            external,
            self.settings,
        ));

        let lifecycle_service = Arc::new(AccountLifecycleService::new(Arc::clone(&ctx)));
        let query_service = Arc::new(AccountQueryService::new(
            Arc::clone(&ctx),
            UriGenerator::new(self.uri_profile),
        ));

        Ok(AppState {
            ctx,
            lifecycle_service,
            query_service,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
