//! Transport boundary decoding.
//!
//! Raw event records arrive as JSON objects from a socket, a pipe or a
//! replay file. Structurally broken records are rejected here with a
//! [`BoundaryError`] and never reach the reducer. Records whose `type` this
//! version does not know are turned into [`PipelineEvent::Unknown`] so the
//! reducer can log them.

use pp_protocol::event_models::{EventEnvelope, PipelineEvent};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding a raw event record.
#[derive(Error, Debug)]
pub enum BoundaryError {
    /// The record is not a JSON object with a string `type` field.
    #[error("malformed event: {reason}")]
    Malformed { reason: String },

    /// The `type` is known but the fields do not match it.
    #[error("invalid payload for '{event_type}' event: {source}")]
    InvalidPayload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;

/// Decode one JSON text record.
pub fn decode_event(raw: &str) -> BoundaryResult<EventEnvelope> {
    let value: Value = serde_json::from_str(raw).map_err(|e| BoundaryError::Malformed {
        reason: e.to_string(),
    })?;
    decode_value(value)
}

/// Decode one already-parsed JSON record.
pub fn decode_value(value: Value) -> BoundaryResult<EventEnvelope> {
    let Value::Object(map) = &value else {
        return Err(BoundaryError::Malformed {
            reason: "expected a JSON object".to_string(),
        });
    };

    let event_type = match map.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(_) => {
            return Err(BoundaryError::Malformed {
                reason: "'type' must be a string".to_string(),
            })
        }
        None => {
            return Err(BoundaryError::Malformed {
                reason: "missing 'type' field".to_string(),
            })
        }
    };

    if !PipelineEvent::KNOWN_TYPES.contains(&event_type.as_str()) {
        // Keep the producer timestamp if it parses; anything else about an
        // unknown record is opaque.
        let timestamp = map
            .get("timestamp")
            .cloned()
            .and_then(|ts| serde_json::from_value(ts).ok());
        return Ok(EventEnvelope {
            timestamp,
            event: PipelineEvent::Unknown { event_type },
        });
    }

    serde_json::from_value(value).map_err(|source| BoundaryError::InvalidPayload {
        event_type,
        source,
    })
}
