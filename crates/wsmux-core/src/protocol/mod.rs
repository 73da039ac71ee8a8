//! Event frame protocol (text lane only).
//!
//! A frame multiplexes one named event over a shared text connection:
//!
//! ```text
//! PREFIX event SEP tag SEP payload
//! ```
//!
//! - `wire`: the prefix/separator pair, injected once and shared by encoder
//!   and decoder so the two halves cannot drift.
//! - `payload`: the four payload shapes and their single-digit tags.
//! - `frame`: encode/decode and event discovery.
//! - `coerce`: JavaScript-compatible coercion rules used when the caller hands
//!   in an untyped value.
//!
//! Decoders never panic: a frame that cannot be read is reported as `None`.

pub mod coerce;
pub mod frame;
pub mod payload;
pub mod wire;

pub use frame::{Frame, FrameCodec};
pub use payload::{Payload, PayloadType};
pub use wire::{BoolDecoding, WireFormat, DEFAULT_PREFIX, DEFAULT_SEPARATOR};
