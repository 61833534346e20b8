//! Buffered response and per-call options

use std::time::Duration;

use davenport_domain::{DavenportError, Result};
use reqwest::header::{HeaderMap, ETAG};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// A fully buffered HTTP response: status, headers and body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| DavenportError::InvalidResponse(format!("malformed JSON body: {err}")))
    }

    /// `ETag` header value with the surrounding quotes stripped.
    pub fn etag(&self) -> Option<String> {
        self.headers
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_matches('"').to_owned())
    }
}

/// Per-call overrides for a single request.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overall deadline for this call, overriding the client-level timeouts.
    pub timeout: Option<Duration>,
    /// Return non-success responses instead of raising.
    pub fail_silent: bool,
}

impl CallOptions {
    /// Options with silent failure mode enabled.
    pub fn silent() -> Self {
        Self { fail_silent: true, ..Self::default() }
    }

    /// Options with a per-call deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout), ..Self::default() }
    }
}
