//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes a few conventional paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DAVENPORT_URL`: Base URL of the server
//! - `DAVENPORT_USER`: Basic-auth user name
//! - `DAVENPORT_PASSWORD`: Basic-auth password
//! - `DAVENPORT_USE_TLS`: Assume TLS for scheme-less URLs (true/false)
//! - `DAVENPORT_OPEN_TIMEOUT`: Connect timeout in seconds
//! - `DAVENPORT_READ_TIMEOUT`: Read timeout in seconds

use std::path::{Path, PathBuf};

use davenport_domain::{DavenportError, Result, ServerConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DavenportError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<ServerConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `DAVENPORT_URL`, `DAVENPORT_USER` and `DAVENPORT_PASSWORD` are required;
/// the remaining variables fall back to their defaults.
///
/// # Errors
/// Returns `DavenportError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<ServerConfig> {
    let base_url = env_var("DAVENPORT_URL")?;
    let username = env_var("DAVENPORT_USER")?;
    let password = env_var("DAVENPORT_PASSWORD")?;

    let mut config = ServerConfig::new(base_url, username, password);
    config.use_tls = env_bool("DAVENPORT_USE_TLS", config.use_tls);
    if let Ok(value) = std::env::var("DAVENPORT_OPEN_TIMEOUT") {
        config.open_timeout_secs = value
            .parse::<u64>()
            .map_err(|e| DavenportError::Config(format!("Invalid open timeout: {}", e)))?;
    }
    if let Ok(value) = std::env::var("DAVENPORT_READ_TIMEOUT") {
        config.read_timeout_secs = value
            .parse::<u64>()
            .map_err(|e| DavenportError::Config(format!("Invalid read timeout: {}", e)))?;
    }
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes [`probe_config_paths`] for the first file
/// that exists. Supports both JSON and TOML, detected by file extension.
///
/// # Errors
/// Returns `DavenportError::Config` if no file is found, the format is
/// unknown, or the contents do not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ServerConfig> {
    let path = match path {
        Some(path) => path,
        None => probe_config_paths()
            .into_iter()
            .find(|candidate| candidate.exists())
            .ok_or_else(|| {
                DavenportError::Config("No config file found in probed paths".to_owned())
            })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        DavenportError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_config(&path, &contents)
}

/// Conventional config file locations, probed in order.
pub fn probe_config_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./davenport.json"),
        PathBuf::from("./davenport.toml"),
        PathBuf::from("./config/davenport.json"),
        PathBuf::from("./config/davenport.toml"),
    ]
}

fn parse_config(path: &Path, contents: &str) -> Result<ServerConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents).map_err(|e| {
            DavenportError::Config(format!("Invalid JSON in {}: {}", path.display(), e))
        }),
        Some("toml") => toml::from_str(contents).map_err(|e| {
            DavenportError::Config(format!("Invalid TOML in {}: {}", path.display(), e))
        }),
        _ => Err(DavenportError::Config(format!(
            "Unsupported config format: {}",
            path.display()
        ))),
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| DavenportError::Config(format!("Missing environment variable {}", name)))
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name).map(|value| value == "true" || value == "1").unwrap_or(default)
}
