//! In-process stand-in for the sidecar HTTP service.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap();
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

pub struct FakeState {
    health: Mutex<Reply>,
    status: Mutex<Reply>,
    new_conversation: Mutex<Reply>,
    chat_replies: Mutex<VecDeque<Reply>>,
    chat_requests: Mutex<Vec<Value>>,
    chat_delay: Mutex<Option<Duration>>,
    health_delay: Mutex<Option<Duration>>,
    new_conversation_calls: AtomicUsize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            health: Mutex::new(Reply::json(200, json!({"status": "healthy"}))),
            status: Mutex::new(Reply::json(
                200,
                json!({"isLoggedIn": true, "conversationId": null, "headless": true}),
            )),
            new_conversation: Mutex::new(Reply::json(
                200,
                json!({"success": true, "message": "New conversation started"}),
            )),
            chat_replies: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            chat_delay: Mutex::new(None),
            health_delay: Mutex::new(None),
            new_conversation_calls: AtomicUsize::new(0),
        }
    }
}

pub struct FakeSidecar {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeSidecar {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/health", get(health))
            .route("/api/status", get(status))
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

    pub fn set_health(&self, reply: Reply) {
        *self.state.health.lock().unwrap() = reply;
    }

    pub fn set_health_delay(&self, delay: Duration) {
        *self.state.health_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_status(&self, reply: Reply) {
        *self.state.status.lock().unwrap() = reply;
    }

    pub fn set_new_conversation(&self, reply: Reply) {
        *self.state.new_conversation.lock().unwrap() = reply;
    }

    pub fn push_chat_reply(&self, reply: Reply) {
        self.state.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn set_chat_delay(&self, delay: Duration) {
        *self.state.chat_delay.lock().unwrap() = Some(delay);
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().unwrap().clone()
    }

    pub fn new_conversation_calls(&self) -> usize {
        self.state.new_conversation_calls.load(Ordering::SeqCst)
    }
}

/// URL of a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn health(State(state): State<Arc<FakeState>>) -> Reply {
    let delay = *state.health_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state.health.lock().unwrap().clone()
}

async fn status(State(state): State<Arc<FakeState>>) -> Reply {
    state.status.lock().unwrap().clone()
}

async fn chat(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Reply {
    state.chat_requests.lock().unwrap().push(body);
    let delay = *state.chat_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let reply = state.chat_replies.lock().unwrap().pop_front();
    reply.unwrap_or_else(|| Reply::json(200, json!({"success": true, "message": "ok"})))
}

async fn new_conversation(State(state): State<Arc<FakeState>>) -> Reply {
    state.new_conversation_calls.fetch_add(1, Ordering::SeqCst);
    state.new_conversation.lock().unwrap().clone()
}
