//! wsmux core: event frame codec, payload model, and errors.
//!
//! Everything here is pure string work over one text grammar; the client crate
//! adds the connection. No runtime or transport dependency.
//!
//! Malformed inbound frames decode to `None`. `unwrap`, `expect` and `panic!`
//! are denied at the crate level.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, WsMuxError};
pub use protocol::{BoolDecoding, Frame, FrameCodec, Payload, PayloadType, WireFormat};
