use chatgpt_plus_core::{ChatResult, DOMAIN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of the event fired after every `send_message` call
pub fn response_event_type() -> String {
    format!("{}_response", DOMAIN)
}

/// An event on the bridge's event bus
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub data: Value,
    pub time_fired: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            time_fired: Utc::now(),
        }
    }
}

/// Data of the response event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResponseEventData {
    /// The message the caller sent
    pub message: String,
    /// Message of the result, empty if it had none
    pub response: String,
    pub success: bool,
    pub conversation_id: Option<String>,
}

impl ResponseEventData {
    pub fn from_result(message: &str, result: &ChatResult) -> Self {
        Self {
            message: message.to_string(),
            response: result.message.clone().unwrap_or_default(),
            success: result.is_success(),
            conversation_id: result.conversation_id.clone(),
        }
    }

    pub fn into_event(self) -> Event {
        // Only strings and bools, serialization cannot fail
        let data = serde_json::to_value(&self).unwrap_or(Value::Null);
        Event::new(response_event_type(), data)
    }
}
