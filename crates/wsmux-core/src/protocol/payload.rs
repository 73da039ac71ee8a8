//! Payload shapes and their tags.

use serde_json::{Number, Value};

use super::coerce::js_number_string;

/// Single-digit discriminator carried in every frame.
///
/// `3` is reserved (historically raw bytes) and never produced or accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    Text = 0,
    Numeric = 1,
    Boolean = 2,
    Structured = 4,
}

impl PayloadType {
    /// ASCII digit written into the tag position.
    pub fn digit(self) -> char {
        match self {
            PayloadType::Text => '0',
            PayloadType::Numeric => '1',
            PayloadType::Boolean => '2',
            PayloadType::Structured => '4',
        }
    }

    /// Parse the tag byte of an inbound frame. Unknown digits yield `None`.
    pub fn from_digit(b: u8) -> Option<Self> {
        match b {
            b'0' => Some(PayloadType::Text),
            b'1' => Some(PayloadType::Numeric),
            b'2' => Some(PayloadType::Boolean),
            b'4' => Some(PayloadType::Structured),
            _ => None,
        }
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            PayloadType::Text => "text",
            PayloadType::Numeric => "numeric",
            PayloadType::Boolean => "boolean",
            PayloadType::Structured => "json",
        }
    }
}

/// A typed frame payload.
///
/// Callers that know their value's shape build one of these directly; the
/// decoder hands the same type to event listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Numeric(Number),
    Boolean(bool),
    /// Any JSON value, serialized compactly.
    Structured(Value),
}

impl Payload {
    /// Tag this payload is written with.
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::Text(_) => PayloadType::Text,
            Payload::Numeric(_) => PayloadType::Numeric,
            Payload::Boolean(_) => PayloadType::Boolean,
            Payload::Structured(_) => PayloadType::Structured,
        }
    }

    /// Textual body as it appears after the second separator.
    pub fn body(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Numeric(n) => js_number_string(n),
            Payload::Boolean(b) => b.to_string(),
            Payload::Structured(v) => v.to_string(),
        }
    }

    /// Text content, if this is a `Text` payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is a `Numeric` payload that fits `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Payload::Numeric(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Value of a `Boolean` payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// JSON value of a `Structured` payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Lift into a plain JSON value (used by typed listeners).
    pub fn into_value(self) -> Value {
        match self {
            Payload::Text(s) => Value::String(s),
            Payload::Numeric(n) => Value::Number(n),
            Payload::Boolean(b) => Value::Bool(b),
            Payload::Structured(v) => v,
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Boolean(b)
    }
}

impl From<Number> for Payload {
    fn from(n: Number) -> Self {
        Payload::Numeric(n)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Structured(v)
    }
}

macro_rules! numeric_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Payload {
                fn from(n: $t) -> Self {
                    Payload::Numeric(Number::from(n))
                }
            }
        )*
    };
}

numeric_from!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
