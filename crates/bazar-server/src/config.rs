use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";

/// Everything the binary reads from the environment (or `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub frontend_url: String,
    /// When unset, reset mails are only written to the log.
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub empty_search_not_found: bool,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = var("BAZAR_JWT_SECRET").unwrap_or_else(|| DEV_SECRET.to_string());
        if jwt_secret == DEV_SECRET {
            warn!("BAZAR_JWT_SECRET is not set; using the development secret");
        }

        let token_ttl_hours: i64 = parse_var("BAZAR_TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            anyhow::bail!("BAZAR_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            host: var("BAZAR_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var("BAZAR_PORT", 3001)?,
            db_path: PathBuf::from(var("BAZAR_DB_PATH").unwrap_or_else(|| "bazar.db".into())),
            jwt_secret,
            token_ttl_hours,
            frontend_url: var("BAZAR_FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            mail_relay_url: var("BAZAR_MAIL_RELAY_URL"),
            mail_from: var("BAZAR_MAIL_FROM").unwrap_or_else(|| "no-reply@bazar.local".into()),
            empty_search_not_found: parse_var("BAZAR_EMPTY_SEARCH_NOT_FOUND", false)?,
            admin_email: var("BAZAR_ADMIN_EMAIL"),
            admin_password: var("BAZAR_ADMIN_PASSWORD"),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}
