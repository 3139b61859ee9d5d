//! Shared HTTP client for the cloud price store.
//!
//! The store is a PostgREST-style service: rows are addressed by query
//! filters, auth lives under `/auth/v1`, and every request carries the
//! project api key plus an optional user bearer token.

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use kover_core::errors::{Error, Result};

/// Default timeout for remote requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Header carrying the project api key on every request.
const API_KEY_HEADER: &str = "apikey";

/// HTTP client for the remote price store.
///
/// Wire-level policy (retry, TLS) is left to reqwest defaults; this client
/// only maps transport and status failures into the engine's error taxonomy:
/// timeouts and connection errors become `Error::Network`, 401 becomes
/// `Error::Auth`, 403 becomes `Error::Permission`, and malformed bodies
/// become `Error::Network` (a broken remote is a connectivity problem, not a
/// corrupt cache).
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key_header: HeaderValue,
    anon_auth_header: HeaderValue,
}

impl RemoteClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the api key is not a valid header value or the
    /// HTTP client cannot be initialized.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let api_key_header = HeaderValue::from_str(api_key)
            .map_err(|e| Error::Unexpected(format!("Invalid api key format: {e}")))?;
        let anon_auth_header = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::Unexpected(format!("Invalid api key format: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key_header,
            anon_auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, bearer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, self.api_key_header.clone());
        // Anonymous requests authenticate with the project key itself. A
        // bearer token that cannot form a header falls back the same way.
        let auth = bearer
            .and_then(|token| HeaderValue::from_str(&format!("Bearer {token}")).ok())
            .unwrap_or_else(|| self.anon_auth_header.clone());
        headers.insert(AUTHORIZATION, auth);
        headers
    }

    /// Sends a request with a JSON body and parses the JSON response.
    pub(crate) async fn request_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
        prefer: Option<&'static str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[remote] {method} {url}");

        let mut request = self.http.request(method, &url).headers(self.headers(bearer));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("request timed out: {url}"))
            } else {
                Error::Network(format!("request failed: {e}"))
            }
        })?;

        self.parse_response(response).await
    }

    /// Convenience GET without a body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T> {
        self.request_json::<(), T>(Method::GET, path, None, bearer, None)
            .await
    }

    async fn parse_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| truncated(&body));
            return Err(match status {
                StatusCode::UNAUTHORIZED => Error::Auth(detail),
                StatusCode::FORBIDDEN => Error::Permission(detail),
                _ => Error::Network(format!("API error {status}: {detail}")),
            });
        }

        // 204-style responses carry no body; parse them as JSON null so
        // callers expecting `Value` or `Option` still succeed.
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| {
            warn!("[remote] malformed response body: {e}");
            Error::Network(format!("malformed response: {e}"))
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

fn error_detail(body: &str) -> Option<String> {
    let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.error_description).or(parsed.error)
}

fn truncated(body: &str) -> String {
    body.chars().take(200).collect()
}
