use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Redis endpoint used when no URL is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `redis://[:password@]host:port`. `None` means [`DEFAULT_REDIS_URL`].
    pub redis_url: Option<String>,
    pub token_ttl_secs: u64,
    /// PBKDF2 iterations for password hashing.
    pub hash_rounds: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            redis_url: None,
            token_ttl_secs: 86_400,
            hash_rounds: 250_000,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply `PORT` and `REDIS_URL` from the process environment.
    pub fn apply_process_env(&mut self) -> ServerResult<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Apply `PORT` and `REDIS_URL` as resolved by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<()> {
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid PORT: {port:?}")))?;
            self.bind_addr.set_port(port);
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.redis_url = Some(url);
        }
        self.validate()
    }

    /// The Redis URL to connect to.
    pub fn redis_url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.hash_rounds == 0 {
            return Err(ServerError::Config("hash_rounds must be positive".into()));
        }
        if self.token_ttl_secs == 0 {
            return Err(ServerError::Config("token_ttl_secs must be positive".into()));
        }
        if let Some(url) = &self.redis_url {
            let rest = url
                .strip_prefix("redis://")
                .or_else(|| url.strip_prefix("rediss://"))
                .ok_or_else(|| ServerError::Config("invalid redis URL: unsupported scheme".into()))?;
            let host = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
            if host.is_empty() || host.starts_with(':') || host.starts_with('/') {
                return Err(ServerError::Config("invalid redis URL: missing host".into()));
            }
        }
        Ok(())
    }
}
