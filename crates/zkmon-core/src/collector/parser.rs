//! Parsers for four-letter-word responses.
//!
//! These are pure functions over the probe's text output, so they are
//! tested with plain string inputs.

use crate::model::{RawSample, Value};

/// Token a healthy server answers to `ruok`.
pub const ALIVE_TOKEN: &str = "imok";

/// Converts a response token into the most specific value it can hold.
///
/// Preference order: integer, float, boolean, string. Never fails; tokens
/// that are nothing else stay strings (`"3.4.6"`, `"leader"`). Non-finite
/// float spellings such as `inf` or `NaN` also stay strings.
pub fn coerce_value(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return Value::Integer(i);
    }

    if let Ok(f) = token.parse::<f64>()
        && f.is_finite()
    {
        return Value::Float(f);
    }

    if let Some(b) = parse_bool(token) {
        return Value::Boolean(b);
    }

    Value::String(token.to_string())
}

fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") || token.eq_ignore_ascii_case("t") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") || token.eq_ignore_ascii_case("f") {
        Some(false)
    } else {
        None
    }
}

/// Parses a `mntr` style response into raw key/value pairs.
///
/// Format: one `key value` pair per line, whitespace separated.
/// Lines with fewer than two fields are skipped, fields past the second are
/// ignored, and a repeated key keeps its last value.
pub fn parse_response(content: &str) -> RawSample {
    let mut sample = RawSample::new();

    for line in content.split('\n') {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        sample.insert(key.to_string(), coerce_value(value.trim()));
    }

    sample
}

/// Returns whether a `ruok` response acknowledges the server is running.
pub fn is_alive(response: &str) -> bool {
    response.contains(ALIVE_TOKEN)
}

/// Liveness as the numeric status code stored in the sample (`1` or `0`).
pub fn health_status(response: &str) -> Value {
    Value::Integer(i64::from(is_alive(response)))
}
