//! Phone OTP server binary.

use phone_otp_server::{CONFIG_PATH_ENV, PhoneOtpServer, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| "phone-otp.toml".to_string());

    let config = load_config(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(config = %path, "configuration loaded");

    let server = PhoneOtpServer::new(config);
    server.run().await?;

    Ok(())
}
