//! List response normalization.
//!
//! List endpoints answer either with a bare JSON array or with a paginated
//! `{"count": .., "next": .., "results": [...]}` envelope. [`normalize_list`]
//! is the single place where both shapes are folded into a `Vec<T>`, so the
//! stores never branch on response shape.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{NexusError, Result};

/// Converts a list response payload into its items.
///
/// - `[...]` yields the array items.
/// - `{"results": [...], ...}` yields `results`; other envelope keys are ignored.
/// - `null` yields an empty list.
/// - Any other shape is a serialization error.
pub fn normalize_list<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>> {
    match payload {
        Value::Array(_) => Ok(serde_json::from_value(payload)?),
        Value::Object(mut map) => match map.remove("results") {
            Some(results @ Value::Array(_)) => Ok(serde_json::from_value(results)?),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(NexusError::serialization(
                "JSON",
                format!("'results' must be an array, got {}", json_kind(&other)),
            )),
            None => Err(NexusError::serialization(
                "JSON",
                "list response is neither an array nor a {results} envelope",
            )),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(NexusError::serialization(
            "JSON",
            format!("expected a list response, got {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
