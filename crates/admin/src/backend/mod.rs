//! Thala backend API gateway.
//!
//! Thin typed passthrough to the backend REST service. Every call returns an
//! [`ApiResult`]: the parsed body on 2xx, a [`GatewayError`] otherwise. There
//! are no retries, no timeouts and no caching.
//!
//! Two bases are used:
//! - `api_url` (`THALA_API_URL`) for resource CRUD and moderation
//! - `backend_url` (`BACKEND_URL`) for `/api/v1/admin/*` (stats, SQL)

mod admin;
mod resources;
mod schemas;

pub use admin::*;
pub use resources::*;
pub use schemas::*;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::AdminConfig;

/// Result of a backend call.
pub type ApiResult<T> = Result<T, GatewayError>;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend unreachable or transport failure.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Status {
        status: u16,
        /// `error` or `detail` field of the response body, if present.
        message: Option<String>,
    },

    /// 2xx response whose body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Request payload failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Endpoint could not be turned into a URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Upstream status, for `Status` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Fill in `message` for a `Status` error that carried none.
    #[must_use]
    pub fn or_message(self, default: &str) -> Self {
        match self {
            Self::Status {
                status,
                message: None,
            } => Self::Status {
                status,
                message: Some(default.to_string()),
            },
            other => other,
        }
    }

    /// Message suitable for a client-facing error body.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    api_url: String,
    backend_url: String,
}

impl BackendClient {
    /// Create a client for the given bases (trailing slashes are dropped).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api_url: &str, backend_url: &str) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                api_url: api_url.trim_end_matches('/').to_string(),
                backend_url: backend_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Create a client from the admin configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &AdminConfig) -> Result<Self, GatewayError> {
        Self::new(&config.api_url, &config.backend_url)
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.inner.backend_url
    }

    /// Issue a request against `api_url + endpoint` and parse the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure, non-2xx status or an
    /// unparseable body.
    pub async fn request<T, B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.api_endpoint(endpoint)?;
        let response = self.send(method, url, body).await?;
        Self::handle_response(response).await
    }

    /// `api_url + path`, validated.
    pub(crate) fn api_endpoint(&self, path: &str) -> ApiResult<Url> {
        join(&self.inner.api_url, path)
    }

    /// `backend_url + path`, validated.
    pub(crate) fn backend_endpoint(&self, path: &str) -> ApiResult<Url> {
        join(&self.inner.backend_url, path)
    }

    /// `api_url + path + "/" + id`, with `id` percent-encoded as one segment.
    pub(crate) fn api_item(&self, path: &str, id: &str) -> ApiResult<Url> {
        let mut url = self.api_endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(self.inner.api_url.clone()))?
            .push(id);
        Ok(url)
    }

    /// Send a request, returning the response only if it is 2xx.
    ///
    /// Error bodies are read for `error`, then `detail`.
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send_reading(method, url, body, ERROR_OR_DETAIL).await
    }

    /// Like [`Self::send`], reading the error message from `message_keys`
    /// only.
    pub(crate) async fn send_reading<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        message_keys: &[&str],
    ) -> ApiResult<reqwest::Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        tracing::debug!(%method, %url, "Backend request");
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::parse_error(response, message_keys).await)
    }

    /// Parse a successful JSON response.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Build a `Status` error, taking the message from the first usable
    /// `message_keys` field of the body.
    async fn parse_error(response: reqwest::Response, message_keys: &[&str]) -> GatewayError {
        let status = response.status().as_u16();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| error_message(&body, message_keys));

        tracing::warn!(status, message = message.as_deref(), "Backend error response");
        GatewayError::Status { status, message }
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("api_url", &self.inner.api_url)
            .field("backend_url", &self.inner.backend_url)
            .finish_non_exhaustive()
    }
}

fn join(base: &str, path: &str) -> ApiResult<Url> {
    let raw = format!("{base}{path}");
    Url::parse(&raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))
}

/// Error body fields read by default.
pub(crate) const ERROR_OR_DETAIL: &[&str] = &["error", "detail"];
/// Only the `error` field.
pub(crate) const ERROR_ONLY: &[&str] = &["error"];

/// First usable field of an error body among `keys`.
fn error_message(body: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| body.get(key))
        .find_map(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}
