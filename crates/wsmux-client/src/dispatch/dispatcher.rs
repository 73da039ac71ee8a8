use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;

use wsmux_core::{FrameCodec, Payload};

use super::lifecycle::{ConnectionState, Lifecycle};
use super::registry::ListenerRegistry;

/// Native (unframed) message listener.
pub type NativeFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Where one inbound text message went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Decoded and handed to the listeners of its event.
    Event,
    /// Delivered verbatim to native listeners.
    Native,
    /// Prefixed but unreadable, or over the size limit. Nobody was notified.
    Dropped,
}

/// Lifecycle plus listener registries for one connection.
pub struct Dispatcher {
    codec: FrameCodec,
    max_message_bytes: usize,
    lifecycle: Lifecycle,
    native: Mutex<Vec<NativeFn>>,
    events: ListenerRegistry,
}

impl Dispatcher {
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            max_message_bytes: 0,
            lifecycle: Lifecycle::new(),
            native: Mutex::new(Vec::new()),
            events: ListenerRegistry::new(),
        }
    }

    /// Drop inbound text longer than `max` bytes (`0` = unlimited).
    pub fn with_max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.events
    }

    pub fn on_connect(&self, f: impl Fn() + Send + Sync + 'static) {
        self.lifecycle.on_connect(Arc::new(f));
    }

    pub fn on_disconnect(&self, f: impl Fn() + Send + Sync + 'static) {
        self.lifecycle.on_disconnect(Arc::new(f));
    }

    pub fn on_message(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        self.native
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(f));
    }

    pub fn on(&self, event: impl Into<String>, f: impl Fn(&Payload) + Send + Sync + 'static) {
        self.events.add(event, Arc::new(f));
    }

    /// Listener that receives the payload converted into `T`.
    ///
    /// Payloads that do not convert skip this listener only.
    pub fn on_typed<T, F>(&self, event: impl Into<String>, f: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let event = event.into();
        let name = event.clone();
        self.on(event, move |payload: &Payload| {
            match serde_json::from_value::<T>(payload.clone().into_value()) {
                Ok(v) => f(v),
                Err(e) => tracing::debug!(event = %name, error = %e, "typed listener skipped"),
            }
        });
    }

    /// Transport opened.
    pub fn handle_open(&self) {
        if self.lifecycle.open() {
            tracing::debug!("connection open");
        }
    }

    /// Transport closed (or never opened).
    pub fn handle_close(&self) {
        if self.lifecycle.close() {
            tracing::debug!("connection closed");
        }
    }

    /// Route one inbound text message.
    pub fn handle_text(&self, message: &str) -> Route {
        let len = message.len();
        if self.max_message_bytes > 0 && len > self.max_message_bytes {
            tracing::warn!(len, max = self.max_message_bytes, "inbound message too large, dropped");
            return Route::Dropped;
        }

        if self.codec.is_custom(message) {
            let event = self.codec.custom_event(message);
            if !event.is_empty() {
                let Some(payload) = self.codec.decode(event, message) else {
                    tracing::debug!(event, len, "malformed frame dropped");
                    return Route::Dropped;
                };
                let listeners = self.events.listeners(event);
                tracing::trace!(
                    event,
                    tag = payload.payload_type().name(),
                    listeners = listeners.len(),
                    "frame received"
                );
                for f in &listeners {
                    f(&payload);
                }
                return Route::Event;
            }
        }

        let listeners = self
            .native
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for f in &listeners {
            f(message);
        }
        Route::Native
    }
}
