//! Shared error type across wsmux crates.

use thiserror::Error;

/// Stable error codes (safe to match on and to log).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Event name is empty or contains the separator.
    InvalidEvent,
    /// Prefix/separator pair cannot form an unambiguous grammar.
    InvalidWireFormat,
    /// Configuration failed to parse or validate.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// No transport is available yet (still connecting).
    NotConnected,
    /// Disconnect was already requested or the connection is closed.
    AlreadyDisconnected,
    /// Outbound queue is full.
    Backpressure,
    /// Transport-level failure (dial, handshake, I/O).
    Transport,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidEvent => "INVALID_EVENT",
            ErrorCode::InvalidWireFormat => "INVALID_WIRE_FORMAT",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::AlreadyDisconnected => "ALREADY_DISCONNECTED",
            ErrorCode::Backpressure => "BACKPRESSURE",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsMuxError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum WsMuxError {
    #[error("invalid event name: {0:?}")]
    InvalidEvent(String),
    #[error("invalid wire format: {0}")]
    InvalidWireFormat(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("not connected")]
    NotConnected,
    #[error("already disconnected")]
    AlreadyDisconnected,
    #[error("outbound queue full")]
    Backpressure,
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl WsMuxError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            WsMuxError::InvalidEvent(_) => ErrorCode::InvalidEvent,
            WsMuxError::InvalidWireFormat(_) => ErrorCode::InvalidWireFormat,
            WsMuxError::BadConfig(_) => ErrorCode::BadConfig,
            WsMuxError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            WsMuxError::NotConnected => ErrorCode::NotConnected,
            WsMuxError::AlreadyDisconnected => ErrorCode::AlreadyDisconnected,
            WsMuxError::Backpressure => ErrorCode::Backpressure,
            WsMuxError::Transport(_) => ErrorCode::Transport,
            WsMuxError::Internal(_) => ErrorCode::Internal,
        }
    }
}
