//! Status WebSocket with auto-reconnect.
//!
//! [`StatusSocket`] owns a single connection to the registry's
//! `/ws/status` endpoint. Inbound text frames are parsed as JSON and routed
//! through an [`EventRouter`]: every frame goes to the `"message"` channel,
//! and additionally to the channel named by its `type` field.
//!
//! Any closure that was not requested via [`close()`](StatusSocket::close)
//! schedules exactly one reconnect attempt, delayed by an exponential
//! [`Backoff`] that resets once a connection opens.
//!
//! # Example
//!
//! ```rust,ignore
//! use hostwatch_api::websocket::{ReconnectConfig, StatusSocket, status_socket_url};
//!
//! let url = status_socket_url(&"http://localhost:8000".parse()?)?;
//! let socket = StatusSocket::new(url, ReconnectConfig::default());
//! socket.on("status_update", |frame| {
//!     println!("{frame}");
//!     Ok(())
//! });
//! socket.connect();
//! // ...
//! socket.close();
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::router::{EventRouter, ListenerId, ListenerResult};

/// Channel that receives every successfully parsed frame.
pub const MESSAGE_EVENT: &str = "message";

/// Path of the status stream relative to the registry host.
const STATUS_PATH: &str = "/ws/status";

/// A parsed inbound frame, shared between listeners.
pub type Frame = Arc<serde_json::Value>;

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of the status socket. Only the socket itself moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected. Also the state while a reconnect is pending.
    Disconnected,
    Connecting,
    Open,
    /// Terminal until the next explicit `connect()`.
    ClosedIntentionally,
}

// ── ReconnectConfig / Backoff ────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 3s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Reconnect delay tracker.
///
/// Each [`next_delay()`](Self::next_delay) returns the current delay and
/// doubles it for the next call, capped at `max_delay`. Delays never
/// decrease until [`reset()`](Self::reset).
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let current = config.initial_delay.min(config.max_delay);
        Self {
            config,
            current,
            attempts: 0,
        }
    }

    /// Delay to wait before the next attempt; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.attempts = self.attempts.saturating_add(1);
        self.current = self
            .current
            .checked_mul(2)
            .unwrap_or(self.config.max_delay)
            .min(self.config.max_delay);
        delay
    }

    /// Back to the initial delay with a zero attempt counter.
    pub fn reset(&mut self) {
        self.current = self.config.initial_delay.min(self.config.max_delay);
        self.attempts = 0;
    }

    /// Consecutive attempts scheduled since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

// ── URL derivation ───────────────────────────────────────────────────

/// Derive `<ws|wss>://<host>[:port][/prefix]/ws/status` from the registry
/// base URL. A path prefix on the base is kept, matching the REST routes.
pub fn status_socket_url(base: &Url) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let host = base.host_str().ok_or(url::ParseError::EmptyHost)?;
    let prefix = base.path().trim_end_matches('/');
    let raw = match base.port() {
        Some(p) => format!("{scheme}://{host}:{p}{prefix}{STATUS_PATH}"),
        None => format!("{scheme}://{host}{prefix}{STATUS_PATH}"),
    };
    Ok(Url::parse(&raw)?)
}

// ── StatusSocket ─────────────────────────────────────────────────────

/// Handle to the status stream connection.
///
/// Cheaply cloneable. A tokio runtime must be running when
/// [`connect()`](Self::connect) is called. The background task keeps the
/// socket alive until [`close()`](Self::close).
#[derive(Clone, Debug)]
pub struct StatusSocket {
    inner: Arc<SocketInner>,
}

#[derive(Debug)]
struct SocketInner {
    url: Url,
    reconnect: ReconnectConfig,
    router: EventRouter<Frame>,
    state: watch::Sender<ConnectionState>,
    attempts: AtomicU32,
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StatusSocket {
    pub fn new(url: Url, reconnect: ReconnectConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(SocketInner {
                url,
                reconnect,
                router: EventRouter::new(),
                state,
                attempts: AtomicU32::new(0),
                session: Mutex::new(None),
            }),
        }
    }

    /// The stream URL this socket connects to.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Start the connection loop.
    ///
    /// No-op while a loop is already running (connecting, open, or waiting
    /// to reconnect). After [`close()`](Self::close) it starts a fresh loop.
    pub fn connect(&self) {
        let mut session = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if session.as_ref().is_some_and(|s| !s.task.is_finished()) {
            debug!("status socket already connecting or open");
            return;
        }

        let cancel = CancellationToken::new();
        self.inner.state.send_replace(ConnectionState::Connecting);
        let task = tokio::spawn(socket_loop(Arc::clone(&self.inner), cancel.clone()));
        *session = Some(Session { cancel, task });
    }

    /// Close the connection and cancel any pending reconnect. Idempotent.
    pub fn close(&self) {
        let session = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(session) = session {
            session.cancel.cancel();
            info!("status socket closed");
        }
        self.inner.attempts.store(0, Ordering::Relaxed);
        self.inner
            .state
            .send_replace(ConnectionState::ClosedIntentionally);
    }

    /// Register a listener for an event type (`"message"` or a frame `type`).
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Frame) -> ListenerResult + Send + Sync + 'static,
    {
        self.inner.router.on(event, listener)
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.router.off(event, id)
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current_state() == ConnectionState::Open
    }

    /// Consecutive reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::Relaxed)
    }
}

impl SocketInner {
    /// Move to `next` unless the session has been cancelled.
    ///
    /// `close()` cancels first and writes `ClosedIntentionally` second, so
    /// the check inside the watch lock keeps a dying loop from overwriting it.
    fn set_state(&self, cancel: &CancellationToken, next: ConnectionState) {
        self.state.send_if_modified(|state| {
            if cancel.is_cancelled() || *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on closure, back off → reconnect.
async fn socket_loop(inner: Arc<SocketInner>, cancel: CancellationToken) {
    let mut backoff = Backoff::new(inner.reconnect.clone());

    loop {
        inner.set_state(&cancel, ConnectionState::Connecting);

        match connect_and_read(&inner, &cancel, &mut backoff).await {
            Ok(()) => info!("status socket disconnected"),
            Err(e) => warn!(error = %e, attempt = backoff.attempts(), "status socket error"),
        }

        if cancel.is_cancelled() {
            break;
        }

        inner.set_state(&cancel, ConnectionState::Disconnected);
        let delay = backoff.next_delay();
        inner.attempts.store(backoff.attempts(), Ordering::Relaxed);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt = backoff.attempts(),
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    debug!("status socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and read frames until it drops.
///
/// Returns `Ok(())` for a clean end of stream or an intentional close.
async fn connect_and_read(
    inner: &SocketInner,
    cancel: &CancellationToken,
    backoff: &mut Backoff,
) -> Result<(), Error> {
    info!(url = %inner.url, "connecting to status socket");

    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = tokio_tungstenite::connect_async(inner.url.as_str()) => {
            result.map_err(|e| Error::WebSocketConnect(e.to_string()))?
        }
    };

    backoff.reset();
    inner.attempts.store(0, Ordering::Relaxed);
    inner.set_state(cancel, ConnectionState::Open);
    info!("status socket open");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(error = %e, "close frame not delivered");
                }
                return Ok(());
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = dispatch_frame(&inner.router, &text) {
                            warn!(error = %e, "dropping malformed frame");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Err(match frame {
                            Some(cf) => Error::WebSocketClosed {
                                code: u16::from(cf.code),
                                reason: cf.reason.to_string(),
                            },
                            None => Error::WebSocketClosed {
                                code: 1005,
                                reason: "no close payload".into(),
                            },
                        });
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite answers pings automatically
                        trace!("status socket ping");
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        info!("status socket stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, raw frames -- ignore
                    }
                }
            }
        }
    }
}

// ── Frame dispatch ───────────────────────────────────────────────────

/// Parse a text frame and route it.
///
/// Emits on [`MESSAGE_EVENT`] and, if the frame carries a string `type`,
/// on that channel too. Returns the number of successful deliveries.
pub(crate) fn dispatch_frame(router: &EventRouter<Frame>, text: &str) -> Result<usize, Error> {
    let frame: Frame = Arc::new(serde_json::from_str(text).map_err(Error::Frame)?);
    trace!(frame = %frame, "status frame");

    let mut delivered = router.emit(MESSAGE_EVENT, &frame);
    if let Some(kind) = frame.get("type").and_then(serde_json::Value::as_str) {
        delivered += router.emit(kind, &frame);
    }
    Ok(delivered)
}

// ── Tests ────────────────────────────────────────────────────────────
