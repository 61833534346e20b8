//! Client configuration structures

use serde::{Deserialize, Serialize};

/// Default connect/read timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 150;

/// Connection settings for one document database server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server, e.g. `https://db.example.com:6984`. A URL
    /// without a scheme is upgraded according to `use_tls`.
    pub base_url: String,
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Assume TLS when `base_url` carries no scheme.
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    /// Connect timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub open_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl ServerConfig {
    /// Settings for `base_url` with credentials and defaults for the rest.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            use_tls: default_use_tls(),
            open_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_use_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
