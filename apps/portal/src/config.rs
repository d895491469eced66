use reqwest::Url;
use std::{net::SocketAddr, time::Duration};

use crate::application::ApplicationError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Runtime settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the scheduling service, e.g. `https://escala.example.com/api/`.
    pub scheduling_api_url: Url,
    pub scheduling_timeout: Duration,
    /// When unset the portal keeps its data in memory.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub session_ttl_secs: u64,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ApplicationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApplicationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("SCHEDULING_API_URL").ok_or_else(|| {
            ApplicationError::Configuration("SCHEDULING_API_URL is not set".into())
        })?;
        let scheduling_api_url = Url::parse(raw_url.trim()).map_err(|e| {
            ApplicationError::Configuration(format!("SCHEDULING_API_URL is invalid: {e}"))
        })?;
        if scheduling_api_url.cannot_be_a_base() {
            return Err(ApplicationError::Configuration(
                "SCHEDULING_API_URL must be an http(s) base URL".into(),
            ));
        }

        let timeout_secs = parse_or(&lookup, "SCHEDULING_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let session_ttl_secs = parse_or(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let bind_addr = lookup("PORTAL_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ApplicationError::Configuration(format!("PORTAL_BIND_ADDR: {e}")))?;

        Ok(Self {
            scheduling_api_url,
            scheduling_timeout: Duration::from_secs(timeout_secs),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            bind_addr,
            session_ttl_secs,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ApplicationError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ApplicationError::Configuration(format!(
                "{key} must be a positive integer, got {raw:?}"
            ))),
            Ok(value) => Ok(value),
        },
    }
}
