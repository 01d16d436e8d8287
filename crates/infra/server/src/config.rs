//! Server configuration.

use phone_otp_notifier_ismart::IsmartConfig;
use phone_otp_plugin_phone_number::PhoneNumberConfig;
use phone_otp_utils::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PHONE_OTP_CONFIG";
/// Overrides `[sms] password`.
pub const SMS_PASSWORD_ENV: &str = "SMS_GATEWAY_PASSWORD";
/// Overrides `[server] csrf_secret`.
pub const CSRF_SECRET_ENV: &str = "CSRF_SECRET";

/// Longest accepted code lifetime and throttle window: one day.
pub const MAX_CODE_WINDOW_SECS: i64 = 24 * 60 * 60;
/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_SECS: i64 = 365 * 24 * 60 * 60;

/// Server-level configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Log level, used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Key for anti-forgery tokens.
    pub csrf_secret: Option<String>,
    /// Base path for the login routes.
    pub base_path: String,
    /// How often expired codes are purged.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            csrf_secret: None,
            base_path: "/api/auth".to_string(),
            sweep_interval_secs: 60,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("log_level", &self.log_level)
            .field("csrf_secret", &self.csrf_secret.as_ref().map(|_| "[redacted]"))
            .field("base_path", &self.base_path)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish()
    }
}

/// Issue throttling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleSection {
    /// Codes allowed per phone number within the window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: i64,
}

/// OTP flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpSection {
    pub otp_length: u32,
    pub expires_in: u64,
    pub allowed_attempts: Option<u32>,
    pub issue_rate_limit: Option<ThrottleSection>,
    pub delivery_timeout_secs: u64,
    pub default_country_code: Option<String>,
    pub message_template: Option<String>,
    /// Session lifetime in seconds. Default: 14 days.
    pub session_duration_secs: i64,
}

impl Default for OtpSection {
    fn default() -> Self {
        Self {
            otp_length: 6,
            expires_in: 300,
            allowed_attempts: None,
            issue_rate_limit: None,
            delivery_timeout_secs: 10,
            default_country_code: None,
            message_template: None,
            session_duration_secs: 14 * 24 * 60 * 60,
        }
    }
}

impl OtpSection {
    /// Builds the plugin configuration.
    pub fn to_plugin_config(&self) -> PhoneNumberConfig {
        let mut config = PhoneNumberConfig::new()
            .otp_length(self.otp_length)
            .expires_in(self.expires_in)
            .delivery_timeout(Duration::from_secs(self.delivery_timeout_secs));

        if let Some(attempts) = self.allowed_attempts {
            config = config.allowed_attempts(attempts);
        }
        if let Some(throttle) = &self.issue_rate_limit {
            config = config.issue_rate_limit(RateLimitConfig::new(
                throttle.max_requests,
                seconds_within(throttle.window_secs, MAX_CODE_WINDOW_SECS),
            ));
        }
        if let Some(cc) = &self.default_country_code {
            config = config.default_country_code(cc.clone());
        }
        if let Some(template) = &self.message_template {
            config = config.message_template(template.clone());
        }
        config
    }

    /// Session lifetime, clamped to `1..=MAX_SESSION_SECS`.
    pub fn session_duration(&self) -> chrono::Duration {
        seconds_within(self.session_duration_secs, MAX_SESSION_SECS)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CODE_WINDOW_SECS as u64).contains(&self.expires_in) {
            return Err(ConfigError::Invalid(format!(
                "otp.expires_in must be between 1 and {MAX_CODE_WINDOW_SECS} seconds"
            )));
        }
        if !(1..=MAX_SESSION_SECS).contains(&self.session_duration_secs) {
            return Err(ConfigError::Invalid(format!(
                "otp.session_duration_secs must be between 1 and {MAX_SESSION_SECS} seconds"
            )));
        }
        if let Some(throttle) = &self.issue_rate_limit {
            if !(1..=MAX_CODE_WINDOW_SECS).contains(&throttle.window_secs) {
                return Err(ConfigError::Invalid(format!(
                    "otp.issue_rate_limit.window_secs must be between 1 and {MAX_CODE_WINDOW_SECS} seconds"
                )));
            }
        }
        Ok(())
    }
}

fn seconds_within(secs: i64, max: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs.clamp(1, max)).unwrap_or(chrono::Duration::zero())
}

/// Complete server configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub otp: OtpSection,
    pub sms: IsmartConfig,
}

impl AppConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup(SMS_PASSWORD_ENV) {
            self.sms.password = password;
        }
        if let Some(secret) = lookup(CSRF_SECRET_ENV) {
            self.server.csrf_secret = Some(secret);
        }
    }

    /// Checks settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.server.csrf_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(ConfigError::Missing("server.csrf_secret")),
        }
        if self.sms.user_id.is_empty() {
            return Err(ConfigError::Missing("sms.user_id"));
        }
        if self.sms.password.is_empty() {
            return Err(ConfigError::Missing("sms.password"));
        }
        if self.server.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("server.sweep_interval_secs must be positive".into()));
        }
        self.otp.validate()
    }

    /// Returns the anti-forgery key. Call after [`AppConfig::validate`].
    pub fn csrf_secret(&self) -> &str {
        self.server.csrf_secret.as_deref().unwrap_or_default()
    }
}

/// Loads configuration from a TOML file and the process environment.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config = AppConfig::from_toml_str(&content)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Missing setting: {0}")]
    Missing(&'static str),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
port = 9000
csrf_secret = "file-secret"

[otp]
allowed_attempts = 5
default_country_code = "968"

[otp.issue_rate_limit]
max_requests = 3
window_secs = 300

[sms]
user_id = "account"
password = "file-password"
"#;

    #[test]
    fn test_default_config() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8000);
        assert_eq!(server.sweep_interval_secs, 60);

        let otp = OtpSection::default();
        assert_eq!(otp.session_duration(), chrono::Duration::days(14));
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.otp.expires_in, 300);
        assert_eq!(config.sms.timeout_secs, 10);
        assert!(config.sms.gateway_url.starts_with("https://www.ismartsms.net/"));
        config.validate().unwrap();

        let plugin = config.otp.to_plugin_config();
        assert_eq!(plugin.allowed_attempts, Some(5));
        assert!(plugin.issue_rate_limit.enabled);
        assert_eq!(plugin.issue_rate_limit.max_requests, 3);
        assert_eq!(plugin.normalize("91234567").as_deref(), Some("96891234567"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_overrides(|key| match key {
            SMS_PASSWORD_ENV => Some("env-password".to_string()),
            CSRF_SECRET_ENV => Some("env-secret".to_string()),
            _ => None,
        });
        assert_eq!(config.sms.password, "env-password");
        assert_eq!(config.csrf_secret(), "env-secret");
    }

    #[test]
    fn test_missing_secret() {
        let config = AppConfig::from_toml_str(
            r#"
[sms]
user_id = "account"
password = "pw"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("server.csrf_secret"))
        ));
    }

    #[test]
    fn test_missing_sms_section() {
        assert!(matches!(
            AppConfig::from_toml_str("[server]\nport = 1\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_out_of_range_durations() {
        let cases = [
            ("expires_in = 10000000000000", "otp.expires_in"),
            ("expires_in = 0", "otp.expires_in"),
            ("session_duration_secs = 9223372036854775807", "otp.session_duration_secs"),
            ("session_duration_secs = -5", "otp.session_duration_secs"),
            (
                "[otp.issue_rate_limit]\nmax_requests = 3\nwindow_secs = 9223372036854775807",
                "otp.issue_rate_limit.window_secs",
            ),
        ];

        for (otp, setting) in cases {
            let toml = format!(
                "[server]\ncsrf_secret = \"s\"\n\n[otp]\n{otp}\n\n[sms]\nuser_id = \"a\"\npassword = \"p\"\n"
            );
            let config = AppConfig::from_toml_str(&toml).unwrap();
            match config.validate() {
                Err(ConfigError::Invalid(message)) => assert!(message.contains(setting), "{message}"),
                other => panic!("{otp}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_session_duration_is_clamped() {
        let otp = OtpSection {
            session_duration_secs: i64::MAX,
            ..OtpSection::default()
        };
        assert_eq!(otp.session_duration(), chrono::Duration::seconds(MAX_SESSION_SECS));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("file-secret"));
        assert!(!debug.contains("file-password"));
    }
}
