// hostwatch-api: Async Rust client for the hostwatch machine registry (REST + status WebSocket)

pub mod error;
pub mod models;
pub mod rest;
pub mod router;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use rest::MachinesClient;
pub use router::{EventRouter, ListenerId, ListenerResult};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{
    Backoff, ConnectionState, Frame, MESSAGE_EVENT, ReconnectConfig, StatusSocket,
    status_socket_url,
};
