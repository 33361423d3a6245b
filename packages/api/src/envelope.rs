//! # Response envelope normalization
//!
//! The server has shipped two success shapes over time: the payload as the whole
//! body (`{"accessToken": ...}`) and the payload wrapped as
//! `{"result": {"data": {...}}}`. The wrapped form is canonical; the flat form is
//! still accepted. [`decode`] strips the wrapper before deserializing, so nothing
//! above this module ever looks at the envelope.
//!
//! Error bodies carry their message under `message`, `error`, or
//! `result.message`, tried in that order by [`error_message`].

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Return the payload inside `result.data`, or the value itself when unwrapped.
pub fn unwrap_data(mut value: Value) -> Value {
    if let Some(data) = value.get_mut("result").and_then(|r| r.get_mut("data")) {
        return data.take();
    }
    value
}

/// Deserialize a success body in either envelope shape.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    serde_json::from_value(unwrap_data(value))
}

/// Extract the human-readable message from an error body, if it has one.
///
/// Empty strings and non-string values do not count as a message.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    text(value.get("message"))
        .or_else(|| text(value.get("error")))
        .or_else(|| text(value.get("result").and_then(|r| r.get("message"))))
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
