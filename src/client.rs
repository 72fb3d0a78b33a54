//! HTTP client core for the Quiz Master API.
//!
//! Every outbound request goes through [`HttpClient::send`], which wraps
//! the call in two stages:
//!
//! - **Request stage**: injects the `Authorization` header from the session
//!   store (normalizing the `Bearer` prefix) and applies the timeout
//!   policy - notification endpoints get a longer timeout because they fan
//!   out email delivery server-side.
//! - **Response stage**: classifies failures into [`RequestError`] and, on
//!   HTTP 401, invalidates the stored session before re-signaling the
//!   error to the caller.
//!
//! The client itself never retries; endpoint fallback is the
//! [`crate::dispatch::NotificationDispatcher`]'s job.

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;

use crate::auth::AuthGuard;
use crate::config::Config;
use crate::constants::{HTTP_REQUEST_TIMEOUT, NOTIFY_REQUEST_TIMEOUT, NOTIFY_URL_MARKERS};
use crate::session::SessionStore;

/// One outbound API call, immutable once handed to [`HttpClient::send`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the server base URL, starting with `/`.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Builds a GET request for `path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    /// Builds a POST request for `path` with an optional JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body,
        }
    }
}

/// Why a single API call failed.
///
/// The dispatcher treats both variants as "this candidate failed" and only
/// uses the distinction for logging; the 401 side effect happens inside
/// the response stage, not here.
#[derive(Debug)]
pub enum RequestError {
    /// The request never produced a response: connect failure, timeout,
    /// or some other transport-level problem.
    Transport(String),
    /// The server answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text, possibly empty.
        body: String,
    },
}

impl RequestError {
    /// HTTP status code, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(_) => None,
            Self::Status { status, .. } => Some(*status),
        }
    }

    /// Whether this failure means the session was rejected (HTTP 401).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.status() == Some(401)
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::Status { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {status}")
                } else {
                    // Bodies can be whole HTML error pages; keep logs readable
                    let snippet: String = body.chars().take(120).collect();
                    write!(f, "HTTP {status}: {snippet}")
                }
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// Formats the `Authorization` header value for a stored token.
///
/// Token storage may or may not include the scheme prefix depending on how
/// the server handed it out; both forms must produce the same header, so
/// a value already starting with `"Bearer "` passes through unchanged and
/// anything else gets the prefix added. Never double-prefixes.
#[must_use]
pub fn bearer_value(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

/// Whether a request path targets a notification endpoint.
///
/// These calls fan out email delivery on the server and get the long
/// timeout.
#[must_use]
pub fn is_notification_path(path: &str) -> bool {
    NOTIFY_URL_MARKERS.iter().any(|marker| path.contains(marker))
}

/// API client for the Quiz Master server.
///
/// Encapsulates HTTP client configuration, the session store the request
/// stage reads from, and the guard the response stage fires on 401.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
    guard: AuthGuard,
}

impl HttpClient {
    /// Creates a new API client with the default login boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let guard = AuthGuard::new(session.clone());
        Self::with_guard(config, session, guard)
    }

    /// Creates a new API client with an explicit guard.
    ///
    /// Useful for testing or when a GUI shell supplies its own login
    /// boundary.
    pub fn with_guard(config: &Config, session: SessionStore, guard: AuthGuard) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.server_url.clone(),
            session,
            guard,
        })
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the session store this client reads its token from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Sends one request through the interceptor stages.
    ///
    /// On success returns the parsed JSON body (`Value::Null` when the
    /// body is empty or not JSON). On failure returns a classified
    /// [`RequestError`]; a 401 additionally invalidates the session as a
    /// side effect, without swallowing the error.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, RequestError> {
        let url = format!("{}{}", self.base_url, request.path);
        log::debug!("{} {}", request.method, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .header("Content-Type", "application/json");

        // Notification endpoints override the client default timeout
        if is_notification_path(&request.path) {
            builder = builder.timeout(NOTIFY_REQUEST_TIMEOUT);
        }

        match self.session.token() {
            Some(token) => {
                builder = builder.header("Authorization", bearer_value(&token));
            }
            None => {
                log::warn!(
                    "No session token found; sending unauthenticated request to {}",
                    request.path
                );
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RequestError::Transport(format!("request timed out: {e}"))
            } else {
                RequestError::Transport(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>().await.unwrap_or(Value::Null));
        }

        let body = response.text().await.unwrap_or_default();
        let err = RequestError::Status {
            status: status.as_u16(),
            body,
        };

        if err.is_auth_failure() {
            log::info!("Authentication rejected by server, invalidating session");
            self.guard.invalidate_session();
        }

        Err(err)
    }

    /// Convenience wrapper for a GET request.
    pub async fn get(&self, path: &str) -> Result<Value, RequestError> {
        self.send(ApiRequest::get(path)).await
    }

    /// Convenience wrapper for a POST request with an optional JSON body.
    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, RequestError> {
        self.send(ApiRequest::post(path, body)).await
    }
}
