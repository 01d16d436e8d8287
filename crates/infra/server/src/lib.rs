//! # Phone OTP Server
//!
//! Standalone server for phone-number login: an in-memory code store and
//! identity provider, the iSmart SMS gateway, and the phone number plugin
//! mounted on axum.

mod config;

pub use config::{
    AppConfig, CONFIG_PATH_ENV, CSRF_SECRET_ENV, ConfigError, OtpSection, SMS_PASSWORD_ENV,
    ServerConfig, ThrottleSection, load_config,
};

use phone_otp_adapter_memory::MemoryIdentityProvider;
use phone_otp_core::csrf::CsrfGuard;
use phone_otp_core::router::Router;
use phone_otp_core::traits::{AuthPlugin, IdentityProvider, Notifier};
use phone_otp_notifier_ismart::IsmartSmsNotifier;
use phone_otp_plugin_phone_number::PhoneNumberPlugin;
use phone_otp_utils::{CodeStore, MemoryCodeStore, spawn_sweeper};
use std::sync::Arc;
use std::time::Duration;

/// Server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The phone OTP login server.
pub struct PhoneOtpServer {
    /// Server configuration.
    pub config: AppConfig,
    store: Arc<MemoryCodeStore>,
    plugin: PhoneNumberPlugin,
}

impl PhoneOtpServer {
    /// Wires the server with the iSmart gateway.
    pub fn new(config: AppConfig) -> Self {
        let notifier = Arc::new(IsmartSmsNotifier::new(config.sms.clone()));
        Self::with_notifier(config, notifier)
    }

    /// Wires the server with a custom notifier.
    pub fn with_notifier(config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(MemoryCodeStore::new());
        let identities: Arc<dyn IdentityProvider> = Arc::new(
            MemoryIdentityProvider::with_session_duration(config.otp.session_duration()),
        );
        let csrf = Arc::new(CsrfGuard::new(config.csrf_secret()));

        let plugin = PhoneNumberPlugin::new(
            config.otp.to_plugin_config(),
            store.clone(),
            notifier,
            identities,
            csrf,
        );

        Self {
            config,
            store,
            plugin,
        }
    }

    /// Builds the HTTP application.
    pub fn app(&self) -> axum::Router {
        let mut router = Router::new(self.config.server.base_path.clone());
        self.plugin.register_routes(&mut router);
        tracing::info!(plugin = self.plugin.id(), routes = router.len(), "registered plugin routes");

        phone_otp_axum::mount(router)
    }

    /// Starts the sweeper and serves until the process is stopped.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        let store: Arc<dyn CodeStore> = self.store.clone();
        let sweeper = spawn_sweeper(
            store,
            Duration::from_secs(self.config.server.sweep_interval_secs),
        );

        tracing::info!(addr = %addr, "phone OTP server listening");
        let served = axum::serve(listener, self.app()).await;
        sweeper.abort();
        served?;

        Ok(())
    }
}

impl std::fmt::Debug for PhoneOtpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneOtpServer")
            .field("config", &self.config)
            .finish()
    }
}
