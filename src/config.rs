//! Environment-driven configuration

use std::env;

pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL embedded in invite links sent to executors.
    pub app_url: String,
    pub token_secret: String,
    pub mail_relay_url: String,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:placerly.db".into()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            token_secret: env::var("TOKEN_SECRET").unwrap_or_else(|_| {
                tracing::warn!("TOKEN_SECRET not set, using the development secret");
                "placerly-dev-secret".into()
            }),
            mail_relay_url: env::var("MAIL_RELAY_URL")
                .unwrap_or_else(|_| "http://localhost:8025".into()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@placerly.example".into()),
        }
    }
}
