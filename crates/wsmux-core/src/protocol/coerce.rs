//! JavaScript-compatible coercions.
//!
//! Browser peers pick a tag by runtime shape; a value encoded through the
//! untyped path here gets the same tag and body a script client would give it.

use serde_json::{Number, Value};

/// Numeric-like test: `!isNaN(x - 0) && x !== null && x !== "" && x !== false`.
///
/// Note that `true`, whitespace-only strings and `[]` all pass.
pub fn is_numeric_like(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty() && is_numeric_string(s),
        Value::Array(items) => is_numeric_string(&join_array(items)),
        Value::Object(_) => false,
    }
}

/// Body written for a numeric-like value (its JS string form).
pub fn numeric_body(v: &Value) -> String {
    match v {
        Value::Number(n) => js_number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_array(items),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// `Number(s)` is not NaN.
pub fn is_numeric_string(s: &str) -> bool {
    let t = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if t.is_empty() {
        return true;
    }
    if matches!(t, "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }
    let radix = match t.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = t.get(2..).unwrap_or("");
        return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    }
    // Rust's float parser also takes "inf"/"nan"; JS does not.
    if t.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
        return false;
    }
    t.parse::<f64>().is_ok()
}

/// `String(n)` for a JSON number.
pub fn js_number_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or(0.0);
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if f.fract() == 0.0 && abs < 1e21 {
        return format!("{f:.0}");
    }
    if abs >= 1e21 || abs < 1e-6 {
        let s = format!("{f:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    f.to_string()
}

/// `Array.prototype.join(",")` with JS element stringification.
pub fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(|v| match v {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => js_number_string(n),
            Value::String(s) => s.clone(),
            Value::Array(inner) => join_array(inner),
            Value::Object(_) => "[object Object]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// `parseInt(s)`: leading whitespace, optional sign, `0x` hex or a decimal
/// digit run; trailing garbage is ignored. No digits is `None`.
///
/// Results that fit `i64` or `u64` are exact; anything larger becomes the
/// nearest `f64`, as a JS peer would see it.
pub fn parse_int(s: &str) -> Option<Number> {
    let t = s.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let (negative, t) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let (radix, digits) = match t.get(..2) {
        Some("0x" | "0X") => (16, &t[2..]),
        _ => (10, t),
    };

    let len = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let run = &digits[..len];
    if run.is_empty() {
        return None;
    }

    let magnitude = match i128::from_str_radix(run, radix) {
        Ok(m) => m,
        Err(_) => {
            let approx = if radix == 10 {
                run.parse::<f64>().ok()?
            } else {
                run.chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
            };
            // hundreds of digits overflow to infinity, which has no JSON form
            return Number::from_f64(if negative { -approx } else { approx });
        }
    };
    let value = if negative { -magnitude } else { magnitude };
    if let Ok(i) = i64::try_from(value) {
        return Some(Number::from(i));
    }
    if let Ok(u) = u64::try_from(value) {
        return Some(Number::from(u));
    }
    // `as` rounds to the nearest f64
    Number::from_f64(value as f64)
}

/// Boolean spellings accepted by the literal decode policy.
pub fn parse_bool_literal(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
