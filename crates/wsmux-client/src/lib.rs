//! wsmux client: many named events over one WebSocket connection.
//!
//! This crate wires the frame codec from `wsmux-core` to a connection
//! lifecycle, per-event listener registries, and a pluggable transport. The
//! default transport is `tokio-tungstenite`; anything implementing
//! [`transport::Connector`] can stand in for it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod dispatch;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use dispatch::{ConnectionState, Dispatcher, ListenerRegistry, Route};
