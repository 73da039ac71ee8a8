//! Top-level facade crate for wsmux.
//!
//! Re-exports the frame codec and the client so users can depend on a single crate.

pub mod core {
    pub use wsmux_core::*;
}

pub mod client {
    pub use wsmux_client::*;
}
