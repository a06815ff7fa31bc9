use chatgpt_plus_core::{ChatResult, DOMAIN};
use serde::{Deserialize, Serialize};

pub const SERVICE_SEND_MESSAGE: &str = "send_message";
pub const SERVICE_NEW_CONVERSATION: &str = "new_conversation";

/// Returned when a service is called while no config entry is loaded
pub const NO_AGENT_ERROR: &str = "No agent available";

/// Data of a `send_message` service call
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SendMessageData {
    /// The message to forward to ChatGPT
    pub message: String,
}

/// Path of a service call on the bridge daemon's HTTP API
pub fn service_path(service: &str) -> String {
    format!("/api/services/{}/{}", DOMAIN, service)
}

/// Both services answer with a chat result; failures to even reach a
/// handler use the same shape.
pub type ServiceResponse = ChatResult;

pub fn no_agent_response() -> ServiceResponse {
    ChatResult::failure(NO_AGENT_ERROR, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_path() {
        assert_eq!(
            service_path(SERVICE_SEND_MESSAGE),
            "/api/services/chatgpt_plus_ha/send_message"
        );
        assert_eq!(
            service_path(SERVICE_NEW_CONVERSATION),
            "/api/services/chatgpt_plus_ha/new_conversation"
        );
    }

    #[test]
    fn test_send_message_data_requires_message() {
        assert!(serde_json::from_value::<SendMessageData>(json!({})).is_err());
        assert!(serde_json::from_value::<SendMessageData>(json!({"message": 42})).is_err());
        assert!(
            serde_json::from_value::<SendMessageData>(json!({"message": "hi", "extra": 1})).is_err()
        );

        let data: SendMessageData = serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(data.message, "hi");
    }

    #[test]
    fn test_no_agent_response() {
        assert_eq!(
            serde_json::to_value(no_agent_response()).unwrap(),
            json!({"success": false, "error": "No agent available"})
        );
    }
}
