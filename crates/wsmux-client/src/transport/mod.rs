//! Transport layer.
//!
//! The dispatcher only needs three signals (open, text, close) and two
//! actions (send text, close). `Connector` produces a `Connection` carrying
//! both; resolving `connect` is the open signal.

pub mod ws;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use wsmux_core::error::Result;

pub use ws::{WsConnector, WsTransport};

/// Inbound signal from a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One text message (one transport message = one application message).
    Text(String),
    /// The connection ended. The event stream ending means the same.
    Closed { code: u16, reason: String },
}

/// Outbound half. Synchronous so listeners can emit from inside callbacks.
pub trait Transport: Send + Sync {
    /// Queue `text` verbatim.
    fn send_text(&self, text: String) -> Result<()>;
    /// Start a close handshake. The close signal arrives on the event stream.
    fn close(&self) -> Result<()>;
}

/// An established connection.
pub struct Connection {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str, protocols: &[String]) -> Result<Connection>;
}

/// Give a bare or HTTP endpoint a WebSocket scheme.
///
/// `http://` becomes `ws://`, `https://` becomes `wss://`, and an endpoint
/// without a scheme gets `ws://`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        endpoint.to_string()
    } else if let Some(rest) = endpoint.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{endpoint}")
    }
}
