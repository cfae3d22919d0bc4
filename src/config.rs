use std::env;

use thiserror::Error;

/// Fallback destination for order-confirmation messages when ADMIN_PHONE is
/// not configured.
pub const DEFAULT_ADMIN_PHONE: &str = "+919876543210";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// All environment-level configuration, read and validated once at startup.
/// Request handlers never touch the environment directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Admin phone number that receives order-confirmation notifications.
    pub admin_phone: String,
    /// WhatsApp gateway endpoint. When unset, notifications are logged only.
    pub whatsapp_gateway_url: Option<String>,
    /// Bootstrap admin account, seeded at startup if both are present.
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_raw = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT", port_raw))?;

        let admin_phone =
            env::var("ADMIN_PHONE").unwrap_or_else(|_| DEFAULT_ADMIN_PHONE.to_string());

        Ok(AppConfig {
            database_url,
            host,
            port,
            jwt_secret,
            admin_phone,
            whatsapp_gateway_url: env::var("WHATSAPP_GATEWAY_URL").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").ok(),
        })
    }
}
