// ── Core error types ──
//
// User-facing errors from hostwatch-core. The `From<hostwatch_api::Error>`
// impl translates transport-layer failures into fetch and connection
// variants; callers never match on reqwest or tungstenite errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach registry at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// `timeout_secs` is `None` when the HTTP client was supplied by the
    /// caller and its timeout is unknown.
    #[error("Registry request timed out{}", after_secs(*.timeout_secs))]
    Timeout { timeout_secs: Option<u64> },

    // ── Fetch errors ─────────────────────────────────────────────────
    /// Non-success response. `status` is the HTTP status code.
    #[error("Registry returned HTTP {status}: {message}")]
    Fetch { status: u16, message: String },

    #[error("Host not found: {id}")]
    HostNotFound { id: String },

    #[error("Unexpected response from registry: {message}")]
    InvalidResponse { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

fn after_secs(secs: Option<u64>) -> String {
    secs.map(|s| format!(" after {s}s")).unwrap_or_default()
}

impl CoreError {
    /// HTTP status carried by a fetch failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => Some(*status),
            Self::HostNotFound { .. } => Some(404),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hostwatch_api::Error> for CoreError {
    fn from(err: hostwatch_api::Error) -> Self {
        use hostwatch_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: None }
                } else if let Some(status) = e.status() {
                    CoreError::Fetch {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout {
                timeout_secs: Some(timeout_secs),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status, message } => CoreError::Fetch { status, message },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            ApiError::Frame(e) => CoreError::InvalidResponse {
                message: format!("malformed frame: {e}"),
            },
        }
    }
}
