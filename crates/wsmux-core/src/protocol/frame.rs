//! Frame encode/decode (panic-free).
//!
//! Parsing rules:
//! - Never index raw bytes without a length check; slices go through `get`.
//! - A frame that cannot be read decodes to `None`, never to an error.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

use super::coerce::{is_numeric_like, numeric_body, parse_bool_literal, parse_int};
use super::payload::{Payload, PayloadType};
use super::wire::{BoolDecoding, WireFormat};

/// One event emission on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Event name (non-empty, separator-free).
    pub event: String,
    /// Payload shape.
    pub tag: PayloadType,
    /// Textual payload after the second separator.
    pub body: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, tag: PayloadType, body: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            tag,
            body: body.into(),
        }
    }

    pub fn from_payload(event: impl Into<String>, payload: &Payload) -> Self {
        Self::new(event, payload.payload_type(), payload.body())
    }

    /// Tag `0` with an empty body: what absent or unsupported data encodes to.
    pub fn degenerate(event: impl Into<String>) -> Self {
        Self::new(event, PayloadType::Text, String::new())
    }

    /// Pick tag and body by runtime shape, first match wins:
    /// numeric-like, boolean, text, structured, then absent.
    pub fn infer(event: impl Into<String>, data: Option<&Value>) -> Self {
        let Some(v) = data else {
            return Self::degenerate(event);
        };
        if is_numeric_like(v) {
            return Self::new(event, PayloadType::Numeric, numeric_body(v));
        }
        match v {
            Value::Bool(b) => Self::new(event, PayloadType::Boolean, b.to_string()),
            Value::String(s) => Self::new(event, PayloadType::Text, s.clone()),
            Value::Object(_) | Value::Array(_) => {
                Self::new(event, PayloadType::Structured, v.to_string())
            }
            Value::Null | Value::Number(_) => Self::degenerate(event),
        }
    }

    /// `PREFIX event SEP tag SEP body`.
    pub fn to_wire(&self, format: &WireFormat) -> String {
        let sep = format.separator();
        let mut out = String::with_capacity(format.header_len(&self.event) + self.body.len());
        out.push_str(format.prefix());
        out.push_str(&self.event);
        out.push(sep);
        out.push(self.tag.digit());
        out.push(sep);
        out.push_str(&self.body);
        out
    }
}

/// Encoder and decoder bound to one `WireFormat`.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    format: WireFormat,
}

impl FrameCodec {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &WireFormat {
        &self.format
    }

    /// Encode a typed payload. Fails only on an invalid event name.
    pub fn encode(&self, event: &str, payload: &Payload) -> Result<String> {
        self.format.validate_event(event)?;
        Ok(Frame::from_payload(event, payload).to_wire(&self.format))
    }

    /// Encode an untyped value, choosing the tag by shape (see [`Frame::infer`]).
    pub fn encode_value(&self, event: &str, data: Option<&Value>) -> Result<String> {
        self.format.validate_event(event)?;
        Ok(Frame::infer(event, data).to_wire(&self.format))
    }

    /// Encode anything serde can turn into JSON.
    ///
    /// Values serde cannot represent still produce a frame (tag `0`, empty
    /// body) so emitting stays total; the failure is only logged.
    pub fn encode_serialize<T: Serialize + ?Sized>(&self, event: &str, data: &T) -> Result<String> {
        self.format.validate_event(event)?;
        let frame = match serde_json::to_value(data) {
            Ok(v) => Frame::infer(event, Some(&v)),
            Err(e) => {
                tracing::warn!(event, error = %e, "unsupported payload shape, sending empty frame");
                Frame::degenerate(event)
            }
        };
        Ok(frame.to_wire(&self.format))
    }

    /// Decode the payload of a frame known to belong to `event`.
    ///
    /// This does not re-check the prefix or the event name; it reads the tag
    /// and body at the offsets implied by `event`'s length.
    pub fn decode(&self, event: &str, message: &str) -> Option<Payload> {
        let skip_len = self.format.header_len(event);
        if message.len() < skip_len + 1 {
            return None;
        }

        let tag = PayloadType::from_digit(*message.as_bytes().get(skip_len - 2)?)?;
        let body = message.get(skip_len..)?;

        match tag {
            PayloadType::Numeric => parse_int(body).map(Payload::Numeric),
            PayloadType::Boolean => match self.format.bool_decoding() {
                BoolDecoding::Truthy => Some(Payload::Boolean(!body.is_empty())),
                BoolDecoding::Literal => parse_bool_literal(body).map(Payload::Boolean),
            },
            PayloadType::Text => Some(Payload::Text(body.to_string())),
            PayloadType::Structured => serde_json::from_str(body).ok().map(Payload::Structured),
        }
    }

    /// Event name of a frame, or `""` when the message is too short or has no
    /// separator after the prefix.
    pub fn custom_event<'a>(&self, message: &'a str) -> &'a str {
        let offset = self.format.prefix().len();
        if message.len() < offset {
            return "";
        }
        message
            .get(offset..)
            .and_then(|rest| rest.split_once(self.format.separator()))
            .map(|(event, _)| event)
            .unwrap_or("")
    }

    /// Whether the message carries the frame prefix anywhere.
    pub fn is_custom(&self, message: &str) -> bool {
        message.contains(self.format.prefix())
    }
}
