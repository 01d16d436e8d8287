//! # iSmart SMS Notifier
//!
//! Delivers one-time codes through the iSmart bulk SMS HTTP gateway. Each
//! call is a single GET request; the gateway answers with a small integer
//! status that is mapped to a [`DeliveryResult`] here and nowhere else.

mod status;

pub use status::IsmartStatus;

use async_trait::async_trait;
use phone_otp_core::traits::Notifier;
use phone_otp_core::types::DeliveryResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default gateway endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "https://www.ismartsms.net/iBulkSMS/HttpWS/SMSDynamicAPI.aspx";

/// Gateway account settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct IsmartConfig {
    /// Endpoint the request is sent to.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Account user id.
    pub user_id: String,
    /// Account password.
    pub password: String,
    /// Client-side request timeout in seconds. Default: 10.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl IsmartConfig {
    /// Creates a config for the default gateway.
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            gateway_url: default_gateway_url(),
            user_id: user_id.into(),
            password: password.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Sets the gateway URL.
    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl std::fmt::Debug for IsmartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsmartConfig")
            .field("gateway_url", &self.gateway_url)
            .field("user_id", &self.user_id)
            .field("password", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// [`Notifier`] backed by the iSmart gateway.
#[derive(Debug, Clone)]
pub struct IsmartSmsNotifier {
    config: IsmartConfig,
    client: reqwest::Client,
}

impl IsmartSmsNotifier {
    /// Creates a notifier with its own HTTP client.
    pub fn new(config: IsmartConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the gateway settings.
    pub fn config(&self) -> &IsmartConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for IsmartSmsNotifier {
    async fn send(&self, identifier: &str, message: &str) -> DeliveryResult {
        let recipient = format!("+{}", identifier);
        let request = self
            .client
            .get(&self.config.gateway_url)
            .query(&[
                ("UserId", self.config.user_id.as_str()),
                ("Password", self.config.password.as_str()),
                ("MobileNo", recipient.as_str()),
                ("Lang", "0"),
                ("FLashSMS", "y"),
                ("Message", message),
            ])
            .timeout(Duration::from_secs(self.config.timeout_secs));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "SMS gateway request failed");
                return DeliveryResult::TransportError(e.to_string());
            }
        };

        let http_status = response.status();
        if !http_status.is_success() {
            tracing::warn!(status = %http_status, "SMS gateway returned HTTP error");
            return DeliveryResult::TransportError(format!("gateway returned HTTP {}", http_status));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read SMS gateway response");
                return DeliveryResult::TransportError(e.to_string());
            }
        };

        let status = IsmartStatus::parse(&body);
        tracing::debug!(status = status.code(), "SMS gateway responded");
        status.into_delivery_result()
    }
}
