// ── Runtime connection configuration ──
//
// Describes how to reach a hostwatch registry. The CLI builds a
// `ControllerConfig` from its own settings; core never reads files.

use std::time::Duration;

use url::Url;

use hostwatch_api::{ReconnectConfig, TlsMode};

use crate::model::StatusFilter;

/// Configuration for one controller session.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Registry base URL (e.g. `http://localhost:8000`). The status socket
    /// URL is derived from it.
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Per-request REST timeout.
    pub timeout: Duration,
    /// Interval between automatic snapshot reloads. Zero disables them.
    pub refresh_interval: Duration,
    /// Status socket reconnect backoff.
    pub reconnect: ReconnectConfig,
    /// Subscribe to the status stream on connect.
    pub websocket_enabled: bool,
    /// Status stream URL. Derived from `url` when unset.
    pub stream_url: Option<Url>,
    /// Filter used by the first snapshot load.
    pub filter: StatusFilter,
}

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(60),
            reconnect: ReconnectConfig::default(),
            websocket_enabled: true,
            stream_url: None,
            filter: StatusFilter::ALL,
        }
    }
}
