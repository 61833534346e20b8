//! Authenticated request client
//!
//! Builds basic-auth requests for the five HTTP verbs, dispatches them
//! through the transport, and classifies responses: non-success statuses
//! raise a structured failure unless the call opted into silent mode.
//!
//! Bulk components depend on the [`DocumentApi`] trait rather than the
//! concrete [`RequestClient`], so they can be exercised against stubs.

pub mod client;
pub mod response;

use async_trait::async_trait;
use davenport_domain::Result;
use serde_json::Value;

pub use client::RequestClient;
pub use response::{ApiResponse, CallOptions};

/// Verb-level capability the facade and bulk components are built on.
///
/// All verbs raise [`davenport_domain::DavenportError::UnexpectedStatus`] on
/// a non-2xx response, except `head`, which is silent by default: a 404 is an
/// expected outcome when probing for existence or a revision.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse>;
    async fn head(&self, path: &str) -> Result<ApiResponse>;
    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse>;
    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse>;
    async fn delete(&self, path: &str) -> Result<ApiResponse>;
}
