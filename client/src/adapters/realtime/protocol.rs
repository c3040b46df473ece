//! Realtime channel frames
//!
//! The backend speaks the Phoenix channel protocol (vsn 1.0.0): every
//! websocket text message is a JSON object with `topic`, `event`, `payload`
//! and `ref`. Row changes arrive as `postgres_changes` events.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::rest::rows;
use crate::domain::ports::{ChangeEvent, ChangeTable};
use crate::error::RealtimeError;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_CHANGES: &str = "postgres_changes";

const PHOENIX_TOPIC: &str = "phoenix";
const SCHEMA: &str = "public";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// Channel topic for a subscription name
pub fn channel_topic(name: &str) -> String {
    format!("realtime:{}", name)
}

impl Frame {
    /// Join `topic` listening to every change on `tables`
    pub fn join(topic: &str, tables: &[ChangeTable], access_token: &str, reference: u64) -> Self {
        let changes: Vec<Value> = tables
            .iter()
            .map(|table| json!({ "event": "*", "schema": SCHEMA, "table": table.name() }))
            .collect();

        Self {
            topic: topic.to_string(),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": changes,
                },
                "access_token": access_token,
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(topic: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn encode(&self) -> Result<String, RealtimeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, RealtimeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Error reason carried by a failed `phx_reply`, if any
    pub fn reply_error(&self) -> Option<String> {
        if self.event != EVENT_REPLY {
            return None;
        }
        match self.payload.get("status").and_then(Value::as_str) {
            Some("ok") => None,
            _ => Some(
                self.payload
                    .get("response")
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "join rejected".to_string()),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: String,
    table: String,
    #[serde(default)]
    record: Value,
    #[serde(default)]
    old_record: Value,
}

/// Translate a `postgres_changes` frame into a change event.
///
/// Returns `Ok(None)` for frames that carry no row change.
pub fn decode_change(frame: &Frame) -> Result<Option<ChangeEvent>, RealtimeError> {
    if frame.event != EVENT_CHANGES {
        return Ok(None);
    }
    let data = frame
        .payload
        .get("data")
        .cloned()
        .ok_or_else(|| RealtimeError::Protocol("change without data".to_string()))?;
    let data: ChangeData = serde_json::from_value(data)?;

    let table: ChangeTable = data.table.parse().map_err(RealtimeError::Protocol)?;
    let invalid = |e: crate::error::DomainError| RealtimeError::Protocol(e.to_string());

    let event = match (table, data.kind.as_str()) {
        (ChangeTable::Likes, _) => ChangeEvent::LikesChanged,
        (ChangeTable::Posts, "INSERT") => {
            ChangeEvent::PostInserted(rows::decode_id(data.record).map_err(invalid)?)
        }
        (ChangeTable::Posts, "UPDATE") => {
            ChangeEvent::PostUpdated(rows::decode_patch(data.record).map_err(invalid)?)
        }
        (ChangeTable::Posts, "DELETE") => {
            ChangeEvent::PostDeleted(rows::decode_id(data.old_record).map_err(invalid)?)
        }
        (ChangeTable::Posts, other) => {
            return Err(RealtimeError::Protocol(format!(
                "Unknown change type: {}",
                other
            )))
        }
    };
    Ok(Some(event))
}
