mod support;

use chatgpt_plus_core::{ChatResult, SidecarClient, Timeouts, TIMEOUT_MESSAGE};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::{closed_port_url, FakeSidecar, Reply};

fn agent(url: &str) -> SidecarClient {
    SidecarClient::new(reqwest::Client::new(), url, Timeouts::default())
}

#[tokio::test]
async fn test_conversation_id_carried_to_next_message() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "hi", "conversationId": "c1"}),
    ));
    let agent = agent(&sidecar.url);

    let first = agent.send_message("hello").await;
    assert!(first.is_success());
    assert_eq!(first.message.as_deref(), Some("hi"));
    assert_eq!(agent.conversation_id().await.as_deref(), Some("c1"));

    agent.send_message("again").await;

    let requests = sidecar.chat_requests();
    assert_eq!(requests[0], json!({"message": "hello"}));
    assert_eq!(requests[1], json!({"message": "again", "conversationId": "c1"}));
}

#[tokio::test]
async fn test_new_conversation_id_replaces_previous() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "one", "conversationId": "c1"}),
    ));
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "two", "conversationId": "c2"}),
    ));
    sidecar.push_chat_reply(Reply::json(200, json!({"success": true, "message": "three"})));
    let agent = agent(&sidecar.url);

    agent.send_message("a").await;
    agent.send_message("b").await;
    assert_eq!(agent.conversation_id().await.as_deref(), Some("c2"));

    // A reply without an id keeps the current one
    agent.send_message("c").await;
    assert_eq!(agent.conversation_id().await.as_deref(), Some("c2"));
    assert_eq!(sidecar.chat_requests()[2]["conversationId"], json!("c2"));
}

#[tokio::test]
async fn test_success_body_returned_as_is() {
    let sidecar = FakeSidecar::start().await;
    let body = json!({"success": true, "message": "hi", "conversationId": "c1", "tokens": 12});
    sidecar.push_chat_reply(Reply::json(200, body.clone()));

    let result = agent(&sidecar.url).send_message("hello").await;
    assert_eq!(serde_json::to_value(&result).unwrap(), body);
}

#[tokio::test]
async fn test_error_status_uses_body_fields() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        500,
        json!({"error": "Failed to send message", "message": "Browser crashed"}),
    ));
    let agent = agent(&sidecar.url);

    let result = agent.send_message("hello").await;
    assert_eq!(
        result,
        ChatResult::failure("Failed to send message", Some("Browser crashed".to_string()))
    );
    assert!(agent.conversation_id().await.is_none());
}

#[tokio::test]
async fn test_error_status_falls_back_to_status_code() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(503, json!({})));
    sidecar.push_chat_reply(Reply::raw(502, "<html>Bad Gateway</html>"));
    let agent = agent(&sidecar.url);

    let result = agent.send_message("hello").await;
    assert!(!result.is_success());
    assert_eq!(result.error.as_deref(), Some("Status 503"));
    assert_eq!(result.message.as_deref(), Some("Unknown error"));

    let result = agent.send_message("hello").await;
    assert!(!result.is_success());
    assert_eq!(result.error.as_deref(), Some("Status 502"));
    assert_eq!(result.message.as_deref(), Some("Unknown error"));
}

#[tokio::test]
async fn test_send_message_timeout() {
    let sidecar = FakeSidecar::start().await;
    sidecar.set_chat_delay(Duration::from_secs(5));
    let timeouts = Timeouts {
        chat: Duration::from_millis(200),
        ..Timeouts::default()
    };
    let agent = SidecarClient::new(reqwest::Client::new(), &sidecar.url, timeouts);

    let result = agent.send_message("hello").await;
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"success": false, "error": "timeout", "message": TIMEOUT_MESSAGE})
    );
}

#[tokio::test]
async fn test_send_message_connection_failure() {
    let agent = agent(&closed_port_url().await);

    let result = agent.send_message("hello").await;
    assert!(!result.is_success());
    assert_eq!(result.error.as_deref(), Some("exception"));
    assert!(result.message.is_some());
}

#[tokio::test]
async fn test_unparseable_success_body_is_exception() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::raw(200, "not json"));

    let result = agent(&sidecar.url).send_message("hello").await;
    assert!(!result.is_success());
    assert_eq!(result.error.as_deref(), Some("exception"));
}

#[tokio::test]
async fn test_new_conversation_clears_id() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "hi", "conversationId": "c1"}),
    ));
    let agent = agent(&sidecar.url);

    agent.send_message("hello").await;
    assert_eq!(agent.conversation_id().await.as_deref(), Some("c1"));

    let result = agent.new_conversation().await;
    assert!(result.is_success());
    assert_eq!(result.message.as_deref(), Some("New conversation started"));
    assert!(agent.conversation_id().await.is_none());

    agent.send_message("fresh").await;
    assert_eq!(sidecar.chat_requests()[1], json!({"message": "fresh"}));
}

#[tokio::test]
async fn test_new_conversation_clears_id_with_empty_body() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "hi", "conversationId": "c1"}),
    ));
    sidecar.set_new_conversation(Reply::raw(200, ""));
    let agent = agent(&sidecar.url);

    agent.send_message("hello").await;
    let result = agent.new_conversation().await;

    assert!(result.is_success());
    assert!(agent.conversation_id().await.is_none());
    assert_eq!(sidecar.new_conversation_calls(), 1);
}

#[tokio::test]
async fn test_new_conversation_passes_bare_body_through() {
    let sidecar = FakeSidecar::start().await;
    sidecar.set_new_conversation(Reply::json(200, json!({})));
    let agent = agent(&sidecar.url);

    let result = agent.new_conversation().await;

    assert_eq!(result.success, None);
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({}));
}

#[tokio::test]
async fn test_new_conversation_clears_id_with_unparseable_body() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "hi", "conversationId": "c1"}),
    ));
    sidecar.set_new_conversation(Reply::raw(200, "started"));
    let agent = agent(&sidecar.url);

    agent.send_message("hello").await;
    let result = agent.new_conversation().await;

    assert!(!result.is_success());
    assert!(agent.conversation_id().await.is_none());
}

#[tokio::test]
async fn test_new_conversation_error_keeps_id() {
    let sidecar = FakeSidecar::start().await;
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "hi", "conversationId": "c1"}),
    ));
    sidecar.set_new_conversation(Reply::json(
        500,
        json!({"error": "Failed to create new conversation", "message": "boom"}),
    ));
    let agent = agent(&sidecar.url);

    agent.send_message("hello").await;
    let result = agent.new_conversation().await;

    assert_eq!(
        result,
        ChatResult::failure("Failed to create new conversation", None)
    );
    assert_eq!(agent.conversation_id().await.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_new_conversation_error_without_body() {
    let sidecar = FakeSidecar::start().await;
    sidecar.set_new_conversation(Reply::raw(404, ""));

    let result = agent(&sidecar.url).new_conversation().await;
    assert_eq!(result, ChatResult::failure("Status 404", None));
}

#[tokio::test]
async fn test_get_status() {
    let sidecar = FakeSidecar::start().await;
    let agent = agent(&sidecar.url);

    let status = agent.get_status().await;
    assert!(status.is_logged_in());
    assert!(status.error.is_none());

    sidecar.set_status(Reply::json(
        500,
        json!({"error": "Failed to get status", "message": "boom"}),
    ));
    let status = agent.get_status().await;
    assert_eq!(status.error.as_deref(), Some("Status 500"));
    assert!(!status.is_logged_in());
}

#[tokio::test]
async fn test_get_status_connection_failure() {
    let status = agent(&closed_port_url().await).get_status().await;
    assert!(status.error.is_some());
}

#[tokio::test]
async fn test_concurrent_turns_stay_in_order() {
    let sidecar = FakeSidecar::start().await;
    sidecar.set_chat_delay(Duration::from_millis(50));
    sidecar.push_chat_reply(Reply::json(
        200,
        json!({"success": true, "message": "one", "conversationId": "c1"}),
    ));
    let agent = Arc::new(agent(&sidecar.url));

    let first = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.send_message("first").await })
    };
    // Let the first turn take the conversation lock
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.send_message("second").await })
    };

    first.await.unwrap();
    second.await.unwrap();

    let requests = sidecar.chat_requests();
    assert_eq!(requests[0], json!({"message": "first"}));
    assert_eq!(requests[1], json!({"message": "second", "conversationId": "c1"}));
}

#[tokio::test]
async fn test_trailing_slash_in_url() {
    let sidecar = FakeSidecar::start().await;
    let agent = agent(&format!("{}/", sidecar.url));

    assert_eq!(agent.endpoint().base_url(), sidecar.url);
    assert!(agent.send_message("hello").await.is_success());
}
