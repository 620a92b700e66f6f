//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use tecoapi_config::ConfigError;
use tecoapi_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to TecoApi at {url}")]
    #[diagnostic(
        code(tecoapi::connection_failed),
        help(
            "Check that the PLC is reachable and `resource` points at its TecoApi root.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(tecoapi::timeout),
        help("Raise `setup_timeout` (or `timeout` for polling) in the config file.")
    )]
    Timeout { timeout_ms: u64 },

    #[error("TecoApi client is not ready")]
    #[diagnostic(code(tecoapi::not_ready))]
    NotReady,

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No password configured")]
    #[diagnostic(
        code(tecoapi::no_credentials),
        help("Set `password` or `password_env` in the config file, or export TECOAPI_PASSWORD.")
    )]
    NoCredentials,

    // ── Objects ──────────────────────────────────────────────────────
    #[error("Object '{path}' could not be read")]
    #[diagnostic(
        code(tecoapi::not_found),
        help("Check the object path; run with -v to see the device response.")
    )]
    NotFound { path: String },

    #[error("Device rejected the write to '{path}'")]
    #[diagnostic(code(tecoapi::rejected))]
    Rejected { path: String },

    #[error("{entity} is read-only")]
    #[diagnostic(code(tecoapi::read_only))]
    ReadOnly { entity: String },

    #[error("API error: {message}")]
    #[diagnostic(code(tecoapi::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tecoapi::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(tecoapi::no_config),
        help(
            "Create it or pass --config.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tecoapi::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON value: {0}")]
    #[diagnostic(
        code(tecoapi::json),
        help("Strings must be quoted, e.g. '\"auto\"'.")
    )]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ReadOnly { .. } => exit_code::PERMISSION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotReady => CliError::NotReady,
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },
            CoreError::NotFound { identifier } => CliError::NotFound { path: identifier },
            CoreError::ReadOnly { entity } => CliError::ReadOnly { entity },
            CoreError::Protocol { path, message } if path.is_empty() => {
                CliError::ApiError { message }
            }
            CoreError::Protocol { path, message } => CliError::ApiError {
                message: format!("{path}: {message}"),
            },
            CoreError::Api { message, status: _ } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials => CliError::NoCredentials,
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
