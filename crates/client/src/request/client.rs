use std::time::Duration;

use async_trait::async_trait;
use davenport_domain::{DavenportError, Result, ServerConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::response::{ApiResponse, CallOptions};
use super::DocumentApi;
use crate::http::HttpClient;

const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Issues authenticated requests against one server and classifies the
/// responses.
///
/// Every request carries the configured basic-auth credentials. Responses
/// are buffered whole; a non-success status raises
/// [`DavenportError::UnexpectedStatus`] with the method, path, status and
/// body unless the call opted into silent mode.
#[derive(Clone)]
pub struct RequestClient {
    http: HttpClient,
    base_url: Url,
    username: String,
    password: String,
}

impl RequestClient {
    /// Build a client from validated configuration.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url, config.use_tls)?;
        let http = HttpClient::builder()
            .open_timeout(Duration::from_secs(config.open_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(concat!("davenport/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue one request with explicit per-call options.
    ///
    /// This is the escape hatch behind the verb methods: callers that need a
    /// per-call deadline or silent failure on verbs other than HEAD come
    /// through here.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: CallOptions,
    ) -> Result<ApiResponse> {
        let url = self.join(path)?;
        let mut builder = self
            .http
            .request(method.clone(), url)
            .basic_auth(&self.username, Some(&self.password));

        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(serde_json::to_vec(body)?);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| DavenportError::Network(err.to_string()))?;
        let response = ApiResponse { status, headers, body: body.to_vec() };

        if !options.fail_silent && !response.is_success() {
            return Err(status_failure(&method, path, &response));
        }
        Ok(response)
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| DavenportError::Config(format!("invalid request path {path:?}: {err}")))
    }
}

#[async_trait]
impl DocumentApi for RequestClient {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, None, CallOptions::default()).await
    }

    // Silent by default: HEAD is used for existence and revision probes
    // where a 404 is an answer, not an error.
    async fn head(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::HEAD, path, None, CallOptions::silent()).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::PUT, path, Some(body), CallOptions::default()).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, path, Some(body), CallOptions::default()).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, path, None, CallOptions::default()).await
    }
}

fn status_failure(method: &Method, path: &str, response: &ApiResponse) -> DavenportError {
    DavenportError::UnexpectedStatus {
        method: method.to_string(),
        path: path.to_owned(),
        status: response.status.as_u16(),
        reason: response.status.canonical_reason().unwrap_or("").to_owned(),
        body: response.text(),
    }
}

/// Parse and normalize the configured base URL.
///
/// A URL without a scheme gets `https://` (or `http://` when TLS is off)
/// prepended; the path is forced to end in `/` so request paths join under
/// any mount prefix.
fn normalize_base_url(raw: &str, use_tls: bool) -> Result<Url> {
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else if use_tls {
        format!("https://{raw}")
    } else {
        format!("http://{raw}")
    };

    let mut url = Url::parse(&candidate)
        .map_err(|err| DavenportError::Config(format!("invalid base URL {raw:?}: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(DavenportError::Config(format!(
                "unsupported URL scheme {other:?} in base URL {raw:?}"
            )))
        }
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
