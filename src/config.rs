use std::net::SocketAddr;

use crate::models::PreviewOptions;

const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid LINK_PREVIEW_BIND {value:?}: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Server settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub user_agent: Option<String>,
    pub accept_invalid_certs: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("LINK_PREVIEW_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_address = bind
            .parse()
            .map_err(|source| ConfigError::InvalidBind { value: bind.clone(), source })?;
        let user_agent = lookup("LINK_PREVIEW_USER_AGENT").filter(|ua| !ua.trim().is_empty());
        let accept_invalid_certs = lookup("LINK_PREVIEW_INSECURE_SSL").as_deref() == Some("1");

        Ok(Self {
            bind_address,
            user_agent,
            accept_invalid_certs,
        })
    }

    /// Layers the server-wide transport settings onto a single request.
    pub fn apply(&self, mut options: PreviewOptions) -> PreviewOptions {
        if options.user_agent.is_none() {
            options.user_agent = self.user_agent.clone();
        }
        options.accept_invalid_certs |= self.accept_invalid_certs;
        options
    }
}
