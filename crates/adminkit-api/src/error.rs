use serde_json::Value;
use thiserror::Error;

/// Structured failure for a non-OK HTTP response.
///
/// `raw` is the response body parsed as JSON, or the body text as a JSON
/// string when it was not valid JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub raw: Value,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "HTTP {}", self.status)
        } else {
            write!(f, "HTTP {}: {}", self.status, self.message)
        }
    }
}

/// Top-level error type for the `adminkit-api` crate.
///
/// Covers every failure mode of a proxied call: application errors from the
/// server, transport failures, body decoding and route schema mistakes.
/// `adminkit-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Application ─────────────────────────────────────────────────
    /// Non-OK status with a JSON or plain-text error body.
    #[error("API error ({0})")]
    Api(ApiError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value could not be encoded.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request value could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A downloaded file could not be persisted.
    #[error("Failed to save download '{filename}': {source}")]
    Download {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    // ── Route schema ────────────────────────────────────────────────
    /// A route segment collides with a reserved chain/verb name.
    #[error("Route segment '{segment}' is reserved")]
    ReservedSegment { segment: String },

    /// A route declaration is malformed.
    #[error("Invalid route {route}: {reason}")]
    InvalidRoute { route: String, reason: String },
}

impl Error {
    /// HTTP status of an application error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api(e) => e.status >= 500,
            _ => false,
        }
    }

    /// The structured application error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}
