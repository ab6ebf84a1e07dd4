//! User-facing errors. Each variant carries a miette code, optional help
//! text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use hostwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach registry at {url}")]
    #[diagnostic(
        code(hostwatch::connection_failed),
        help(
            "Check that the registry is running and accessible.\n\
             URL: {url}\n\
             Try: hostwatch hosts list --server <url>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out{}", after_secs(*.seconds))]
    #[diagnostic(
        code(hostwatch::timeout),
        help("Increase timeout with --timeout or check registry responsiveness.")
    )]
    Timeout { seconds: Option<u64> },

    // ── Registry responses ───────────────────────────────────────────
    #[error("Registry returned HTTP {status}: {message}")]
    #[diagnostic(code(hostwatch::api_error))]
    Api { status: u16, message: String },

    #[error("Host '{id}' not found")]
    #[diagnostic(
        code(hostwatch::not_found),
        help("Run: hostwatch hosts list to see registered hosts")
    )]
    NotFound { id: String },

    #[error("Unexpected response from registry: {message}")]
    #[diagnostic(code(hostwatch::invalid_response))]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hostwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No registry server configured")]
    #[diagnostic(
        code(hostwatch::no_server),
        help(
            "Pass --server <url>, set HOSTWATCH_SERVER, or add `server = \"...\"` to\n\
             {path}"
        )
    )]
    NoServer { path: String },

    #[error(transparent)]
    #[diagnostic(code(hostwatch::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hostwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(hostwatch::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(hostwatch::internal))]
    Internal(String),
}

fn after_secs(secs: Option<u64>) -> String {
    secs.map(|s| format!(" after {s}s")).unwrap_or_default()
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
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::NoServer { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Fetch { status, message } => CliError::Api { status, message },

            CoreError::HostNotFound { id } => CliError::NotFound { id },

            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
