//! Server-level client handle

use std::sync::Arc;

use davenport_domain::{Result, ServerConfig};
use reqwest::Method;
use tracing::info;

use crate::database::Database;
use crate::request::{CallOptions, DocumentApi, RequestClient};

/// Entry point: one authenticated connection profile to a server.
///
/// Cheap to clone; database handles created from it share the underlying
/// HTTP client and its connection pool.
#[derive(Clone)]
pub struct Client {
    api: Arc<RequestClient>,
}

impl Client {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `DavenportError::Config` when the base URL does not parse or
    /// uses a scheme other than http/https.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let api = RequestClient::new(config)?;
        info!(base_url = %api.base_url(), "davenport client ready");
        Ok(Self { api: Arc::new(api) })
    }

    /// Handle to one database on this server.
    pub fn database(&self, name: impl Into<String>) -> Database {
        Database::new(Arc::clone(&self.api), name)
    }

    /// Raw request client, for callers that need verb-level access.
    pub fn request_client(&self) -> &RequestClient {
        &self.api
    }

    /// Whether the server answers its status endpoint.
    pub async fn is_up(&self) -> Result<bool> {
        let response =
            self.api.send(Method::GET, "/_up", None, CallOptions::silent()).await?;
        Ok(response.is_success())
    }

    /// Create a database.
    pub async fn create_database(&self, name: &str) -> Result<()> {
        let path = format!("/{name}");
        self.api.send(Method::PUT, &path, None, CallOptions::default()).await?;
        Ok(())
    }

    /// Delete a database and everything in it.
    pub async fn delete_database(&self, name: &str) -> Result<()> {
        let path = format!("/{name}");
        self.api.delete(&path).await?;
        Ok(())
    }
}
