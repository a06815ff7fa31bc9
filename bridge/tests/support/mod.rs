//! Minimal sidecar stand-in for exercising the daemon end to end.

#![allow(dead_code)]

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeState {
    chat_requests: Mutex<Vec<Value>>,
    chat_turns: AtomicUsize,
    new_conversation_calls: AtomicUsize,
}

pub struct FakeSidecar {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeSidecar {
    /// Replies to every chat with `reply to <message>` in conversation `conv-1`
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
            .route(
                "/api/status",
                get(|| async { Json(json!({"isLoggedIn": true, "headless": false})) }),
            )
            .route("/api/chat", post(chat))
            .route("/api/conversation/new", post(new_conversation))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().unwrap().clone()
    }

    pub fn new_conversation_calls(&self) -> usize {
        self.state.new_conversation_calls.load(Ordering::SeqCst)
    }
}

async fn chat(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Json<Value> {
    let message = body["message"].as_str().unwrap_or_default().to_string();
    state.chat_requests.lock().unwrap().push(body);
    state.chat_turns.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "success": true,
        "message": format!("reply to {}", message),
        "conversationId": "conv-1"
    }))
}

async fn new_conversation(State(state): State<Arc<FakeState>>) -> Json<Value> {
    state.new_conversation_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "message": "New conversation started"}))
}
