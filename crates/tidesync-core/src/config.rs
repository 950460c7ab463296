//! Connection configuration for the tidesync API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wait between successive status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default API host.
pub const DEFAULT_HOST: &str = "https://api.tidesync.io";

/// User-facing dashboard URL. A static deep link, independent of which
/// sync is being tracked.
pub const WEB_BASE_URL: &str = "https://app.tidesync.io";

/// Connection settings for one remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// API host, scheme included.
    pub host: String,
    /// Bearer token for the API (optional for local stubs).
    pub token: Option<String>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: std::env::var("TIDESYNC_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            token: std::env::var("TIDESYNC_TOKEN").ok(),
            user_agent: default_user_agent(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new config from environment variables
    /// (`TIDESYNC_HOST`, `TIDESYNC_TOKEN`).
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Resolve a named connection: `TIDESYNC_<NAME>_HOST` and
    /// `TIDESYNC_<NAME>_TOKEN`, with the name upper-cased and dashes
    /// mapped to underscores. Falls back to the defaults for unset keys.
    pub fn named(name: &str) -> Self {
        let key = name.to_ascii_uppercase().replace('-', "_");
        ConnectionConfig {
            host: std::env::var(format!("TIDESYNC_{key}_HOST"))
                .unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            token: std::env::var(format!("TIDESYNC_{key}_TOKEN")).ok(),
            user_agent: default_user_agent(),
        }
    }

    /// Create config for a specific host.
    pub fn new(host: &str) -> Self {
        ConnectionConfig {
            host: host.to_string(),
            token: None,
            user_agent: default_user_agent(),
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

fn default_user_agent() -> String {
    format!("tidesync/{}", env!("CARGO_PKG_VERSION"))
}
