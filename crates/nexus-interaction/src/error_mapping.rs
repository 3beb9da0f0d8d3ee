//! Folding HTTP failures into `NexusError`.
//!
//! The backend reports errors as a bare string, `{"detail": ...}`,
//! `{"non_field_errors": [...]}` or a map of field names to message lists.
//! Every shape ends up in one `ApiError`.

use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;

use nexus_core::{ApiError, NexusError};

const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Builds the normalized payload for an error response body.
pub fn normalize_error_body(status: Option<u16>, body: &str) -> ApiError {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return ApiError {
            status,
            ..ApiError::default()
        };
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => normalize_error_value(status, value),
        // HTML error pages and plain text bodies.
        Err(_) => ApiError::with_detail(status, trimmed),
    }
}

/// Same as [`normalize_error_body`] for an already parsed payload.
pub fn normalize_error_value(status: Option<u16>, value: Value) -> ApiError {
    let mut error = ApiError {
        status,
        ..ApiError::default()
    };

    match value {
        Value::String(text) => error.detail = non_blank(text),
        Value::Array(items) => error.detail = join_messages(&items),
        Value::Object(map) => {
            let mut fields = BTreeMap::new();
            for (key, value) in map {
                match key.as_str() {
                    "detail" | "message" | "error" if error.detail.is_none() => {
                        error.detail = message_text(&value);
                    }
                    NON_FIELD_ERRORS => {
                        if error.detail.is_none() {
                            error.detail = message_text(&value);
                        }
                    }
                    _ => {
                        let messages = messages_of(&value);
                        if !messages.is_empty() {
                            fields.insert(key, messages);
                        }
                    }
                }
            }
            error.fields = fields;
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }

    error
}

/// Maps a non-success response into the client error.
pub fn map_http_error(status: StatusCode, body: &str) -> NexusError {
    NexusError::Api(normalize_error_body(Some(status.as_u16()), body))
}

/// Maps a transport failure (no response at all).
pub fn map_transport_error(err: reqwest::Error) -> NexusError {
    if err.is_timeout() {
        NexusError::network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        NexusError::network(format!("connection failed: {}", err))
    } else if err.is_decode() {
        NexusError::serialization("JSON", err.to_string())
    } else {
        NexusError::network(err.to_string())
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_blank(text.clone()),
        Value::Array(items) => join_messages(items),
        _ => None,
    }
}

fn join_messages(items: &[Value]) -> Option<String> {
    let joined = items
        .iter()
        .filter_map(|item| item.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    non_blank(joined)
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => vec![text.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::Null => Vec::new(),
        // Nested serializer errors: keep them readable rather than drop them.
        other => vec![other.to_string()],
    }
}
