//! Dispatcher module exports.
//!
//! The dispatcher is sans-IO: transports feed it open/text/close signals and
//! it fans them out to the registered listeners.

pub mod dispatcher;
pub mod lifecycle;
pub mod registry;

pub use dispatcher::{Dispatcher, NativeFn, Route};
pub use lifecycle::{ConnectFn, ConnectionState, Lifecycle};
pub use registry::{ListenerRegistry, MessageFn};
