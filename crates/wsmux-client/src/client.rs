//! Client handle.
//!
//! `Client::connect` returns immediately in `Connecting`; a background task
//! dials, fires the connect listeners, pumps inbound text through the
//! dispatcher, and fires the disconnect listeners once the transport closes.
//! There is no reconnect and no send buffering while connecting.
//!
//! The background task only holds a weak reference. Dropping the last
//! `Client` handle closes the connection (or abandons the dial) without firing
//! the disconnect listeners. A listener that captures a `Client` keeps it alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

use wsmux_core::error::{Result, WsMuxError};
use wsmux_core::{FrameCodec, Payload};

use crate::config::ClientConfig;
use crate::dispatch::{ConnectionState, Dispatcher};
use crate::transport::{Connection, Connector, Transport, TransportEvent, WsConnector};

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    dispatcher: Dispatcher,
    transport: OnceLock<Arc<dyn Transport>>,
    disconnect_requested: AtomicBool,
    abort: Arc<Notify>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if self.disconnect_requested.load(Ordering::SeqCst) {
            return;
        }
        match self.transport.get() {
            Some(transport) => close_quietly(&**transport),
            None => self.abort.notify_one(),
        }
    }
}

impl Client {
    /// Connect with the default config and WebSocket transport.
    ///
    /// Must be called inside a tokio runtime.
    pub fn connect(endpoint: &str, protocols: &[&str]) -> Result<Self> {
        Self::connect_with_config(ClientConfig::default(), endpoint, protocols)
    }

    pub fn connect_with_config(cfg: ClientConfig, endpoint: &str, protocols: &[&str]) -> Result<Self> {
        let connector = Arc::new(WsConnector::new(cfg.transport.clone()));
        Self::connect_with(cfg, connector, endpoint, protocols)
    }

    /// Connect through any [`Connector`].
    pub fn connect_with(
        cfg: ClientConfig,
        connector: Arc<dyn Connector>,
        endpoint: &str,
        protocols: &[&str],
    ) -> Result<Self> {
        cfg.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| WsMuxError::Internal("client must be created inside a tokio runtime".into()))?;

        let dispatcher = Dispatcher::new(FrameCodec::new(cfg.wire_format()?))
            .with_max_message_bytes(cfg.transport.max_message_bytes);

        let client = Self {
            inner: Arc::new(ClientInner {
                dispatcher,
                transport: OnceLock::new(),
                disconnect_requested: AtomicBool::new(false),
                abort: Arc::new(Notify::new()),
            }),
        };

        let protocols: Vec<String> = protocols.iter().map(|p| p.to_string()).collect();
        runtime.spawn(drive(
            Arc::downgrade(&client.inner),
            Arc::clone(&client.inner.abort),
            connector,
            endpoint.to_string(),
            protocols,
        ));

        Ok(client)
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.dispatcher.state()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn codec(&self) -> &FrameCodec {
        self.inner.dispatcher.codec()
    }

    /// Runs on open; runs immediately if the connection is already open.
    pub fn on_connect(&self, f: impl Fn() + Send + Sync + 'static) {
        self.inner.dispatcher.on_connect(f);
    }

    /// Runs once when the connection closes or fails to open.
    pub fn on_disconnect(&self, f: impl Fn() + Send + Sync + 'static) {
        self.inner.dispatcher.on_disconnect(f);
    }

    /// Inbound text that is not an event frame.
    pub fn on_message(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        self.inner.dispatcher.on_message(f);
    }

    pub fn on(&self, event: impl Into<String>, f: impl Fn(&Payload) + Send + Sync + 'static) {
        self.inner.dispatcher.on(event, f);
    }

    pub fn on_typed<T, F>(&self, event: impl Into<String>, f: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_typed(event, f);
    }

    /// Send raw text, unframed.
    pub fn emit_message(&self, text: impl Into<String>) -> Result<()> {
        let transport = self.inner.transport.get().ok_or(WsMuxError::NotConnected)?;
        transport.send_text(text.into())
    }

    pub fn emit(&self, event: &str, data: impl Into<Payload>) -> Result<()> {
        let wire = self.codec().encode(event, &data.into())?;
        self.emit_message(wire)
    }

    /// Emit an untyped value; the tag is picked by shape.
    pub fn emit_value(&self, event: &str, data: Option<&Value>) -> Result<()> {
        let wire = self.codec().encode_value(event, data)?;
        self.emit_message(wire)
    }

    pub fn emit_serialize<T: Serialize + ?Sized>(&self, event: &str, data: &T) -> Result<()> {
        let wire = self.codec().encode_serialize(event, data)?;
        self.emit_message(wire)
    }

    /// Close the connection (or abandon the pending dial).
    ///
    /// The state only changes when the transport reports the close.
    pub fn disconnect(&self) -> Result<()> {
        if self.state() == ConnectionState::Closed
            || self.inner.disconnect_requested.swap(true, Ordering::SeqCst)
        {
            return Err(WsMuxError::AlreadyDisconnected);
        }
        match self.inner.transport.get() {
            Some(transport) => transport.close(),
            None => {
                self.inner.abort.notify_one();
                Ok(())
            }
        }
    }
}

async fn drive(
    inner: Weak<ClientInner>,
    abort: Arc<Notify>,
    connector: Arc<dyn Connector>,
    endpoint: String,
    protocols: Vec<String>,
) {
    let dialed = tokio::select! {
        res = connector.connect(&endpoint, &protocols) => res,
        _ = abort.notified() => {
            tracing::debug!(%endpoint, "dial abandoned");
            if let Some(client) = inner.upgrade() {
                client.dispatcher.handle_close();
            }
            return;
        }
    };

    let Some(client) = inner.upgrade() else {
        // every handle went away while the dial was finishing
        if let Ok(conn) = dialed {
            close_quietly(&*conn.transport);
        }
        return;
    };

    let Connection { transport, mut events } = match dialed {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(%endpoint, error = %e, "connect failed");
            client.dispatcher.handle_close();
            return;
        }
    };

    let transport = client.transport.get_or_init(|| transport);
    // disconnect() may have run between the dial finishing and the slot being set
    if client.disconnect_requested.load(Ordering::SeqCst) {
        close_quietly(&**transport);
    }

    client.dispatcher.handle_open();
    drop(client);

    while let Some(ev) = events.recv().await {
        let Some(client) = inner.upgrade() else {
            tracing::debug!(%endpoint, "client dropped, releasing connection");
            return;
        };
        match ev {
            TransportEvent::Text(text) => {
                client.dispatcher.handle_text(&text);
            }
            TransportEvent::Closed { code, reason } => {
                tracing::debug!(code, reason = %reason, "transport closed");
                break;
            }
        }
    }

    if let Some(client) = inner.upgrade() {
        client.dispatcher.handle_close();
    }
}

fn close_quietly(transport: &dyn Transport) {
    if let Err(e) = transport.close() {
        tracing::debug!(error = %e, "transport close failed");
    }
}
