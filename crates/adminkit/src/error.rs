//! CLI error types with miette diagnostics.
//!
//! Maps core, config and API errors into user-facing errors with
//! actionable help text and stable exit codes.

use adminkit_config::ConfigError;
use adminkit_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(adminkit::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             URL: {url}\n\
             Try: adminkit hello --server {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(adminkit::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(adminkit::auth_failed),
        help(
            "The server rejected the session. Sign in again{login}, then store\n\
             the new token with: adminkit config set-token --profile {profile}"
        )
    )]
    AuthFailed {
        message: String,
        profile: String,
        login: String,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(adminkit::not_found))]
    NotFound { message: String },

    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(adminkit::api_error))]
    Api { status: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adminkit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(adminkit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: adminkit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(adminkit::no_config),
        help(
            "Create a profile with: adminkit config init\n\
             or pass --server. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(adminkit::config))]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(adminkit::keyring),
        help("Use token_env or a plaintext token in the profile when no keyring is available.")
    )]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {message}")]
    #[diagnostic(
        code(adminkit::prompt),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    Prompt { message: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(adminkit::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(adminkit::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Json(_) | Self::Prompt { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile and its login location to
    /// authentication failures.
    pub fn in_profile(self, name: &str, login_url: Option<&str>) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                message,
                profile: name.into(),
                login: login_url.map(|url| format!(" at {url}")).unwrap_or_default(),
            },
            other => other,
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                message,
                profile: "default".into(),
                login: String::new(),
            },
            CoreError::NotFound { message } => CliError::NotFound { message },
            CoreError::ValidationFailed { message } | CoreError::InvalidState { message } => {
                CliError::Validation {
                    field: "input".into(),
                    reason: message,
                }
            }
            CoreError::Api { message, status } => CliError::Api {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },
            CoreError::Download { message } => CliError::Io(std::io::Error::other(message)),
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<adminkit_api::Error> for CliError {
    fn from(err: adminkit_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            e @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => CliError::Config {
                message: e.to_string(),
            },
        }
    }
}
