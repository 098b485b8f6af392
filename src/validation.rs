//! Key and payload checks applied before anything touches the map.

use crate::error::{Error, Result};
use crate::JsonObject;
use serde_json::Value;

/// Longest key accepted, in characters.
pub const MAX_KEY_LEN: usize = 32;

/// Reject keys that are empty or longer than [`MAX_KEY_LEN`] characters.
pub fn validate_key(key: &str) -> Result<()> {
    let length = key.chars().count();
    if length == 0 || length > MAX_KEY_LEN {
        return Err(Error::InvalidKeyLength {
            key: key.to_owned(),
            length,
        });
    }
    Ok(())
}

/// Run the create-time checks in order: null payload, key length, JSON object.
///
/// A payload that doesn't parse at all is `InvalidJson`, but only after the
/// key has been checked.
pub fn validate_create(key: &str, payload: &str) -> Result<()> {
    let parsed = serde_json::from_str::<Value>(payload);
    if matches!(parsed, Ok(Value::Null)) {
        return Err(Error::NullArgument {
            key: key.to_owned(),
            argument: "payload",
        });
    }
    validate_key(key)?;
    match parsed {
        Ok(Value::Object(_)) => Ok(()),
        Ok(other) => Err(Error::InvalidJson {
            key: key.to_owned(),
            reason: format!("expected an object, found {}", kind(&other)),
        }),
        Err(e) => Err(Error::InvalidJson {
            key: key.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Parse stored payload text back into an object.
pub fn parse_object(key: &str, payload: &str) -> Result<JsonObject> {
    serde_json::from_str::<JsonObject>(payload).map_err(|e| Error::InvalidJson {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
