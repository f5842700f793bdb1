// ── Core error types ──
//
// User-facing errors from adminkit-core. The `From<adminkit_api::Error>`
// impl folds transport and HTTP failures into a small set of variants the
// CLI can map onto exit codes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Driver state errors ──────────────────────────────────────────
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Download failed: {message}")]
    Download { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<adminkit_api::Error> for CoreError {
    fn from(err: adminkit_api::Error) -> Self {
        use adminkit_api::Error as ApiErr;

        match err {
            ApiErr::Api(api) => {
                let message = if api.message.is_empty() {
                    api.to_string()
                } else {
                    api.message.clone()
                };
                match api.status {
                    401 | 403 => CoreError::AuthenticationFailed { message },
                    404 => CoreError::NotFound { message },
                    400 | 422 => CoreError::ValidationFailed { message },
                    status => CoreError::Api {
                        message,
                        status: Some(status),
                    },
                }
            }
            ApiErr::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiErr::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiErr::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            e @ (ApiErr::InvalidHeader { .. }
            | ApiErr::ReservedSegment { .. }
            | ApiErr::InvalidRoute { .. }) => CoreError::Config {
                message: e.to_string(),
            },
            ApiErr::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            ApiErr::Serialization(e) => CoreError::Internal(format!("Serialization error: {e}")),
            e @ ApiErr::Download { .. } => CoreError::Download {
                message: e.to_string(),
            },
        }
    }
}
