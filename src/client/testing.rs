//! In-memory transport used by unit tests across the client layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use crate::client::models::session::SessionReader;
use crate::client::services::transport::{error_from_body, Transport};
use crate::common::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub action: String,
    pub payload: Value,
}

/// Answers by action name and records every call.
///
/// Unknown actions answer `{ok: true}`. A gated action parks until the
/// test releases it, after signalling `started`.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, (u16, Value)>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
    started: Arc<Notify>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, action: &str, value: Value) {
        self.failures.lock().unwrap().remove(action);
        self.responses.lock().unwrap().insert(action.to_string(), value);
    }

    pub fn fail(&self, action: &str, status: u16, body: Value) {
        self.failures
            .lock()
            .unwrap()
            .insert(action.to_string(), (status, body));
    }

    /// Parks calls to `action` until the returned handle is notified
    pub fn gate(&self, action: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(action.to_string(), gate.clone());
        gate
    }

    pub fn started(&self) -> Arc<Notify> {
        self.started.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.action).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls().iter().filter(|c| c.action == action).count()
    }

    async fn answer(&self, method: &'static str, action: String, payload: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            action: action.clone(),
            payload,
        });

        let gate = self.gates.lock().unwrap().get(&action).cloned();
        if let Some(gate) = gate {
            self.started.notify_one();
            gate.notified().await;
        }

        if let Some((status, body)) = self.failures.lock().unwrap().get(&action) {
            return Err(error_from_body(*status, body));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&action)
            .cloned()
            .unwrap_or_else(|| json!({"ok": true})))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let action = params
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        let payload: Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect();
        self.answer("GET", action, Value::Object(payload)).await
    }

    async fn post(&self, body: Value) -> Result<Value> {
        let action = body
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("upload")
            .to_string();
        self.answer("POST", action, body).await
    }
}

/// Fixed identity for views that only ask who is looking
pub(crate) struct Viewer {
    pub id: Option<&'static str>,
    pub admin: bool,
}

impl SessionReader for Viewer {
    fn current_user_id(&self) -> Option<String> {
        self.id.map(str::to_string)
    }

    fn is_admin(&self) -> bool {
        self.admin
    }
}

pub(crate) fn user(id: &str, username: &str) -> Value {
    json!({ "id": id, "username": username, "display_name": "" })
}

pub(crate) fn post_json(id: &str, author: &str, likes: u64, liked: bool) -> Value {
    json!({
        "id": id,
        "content": format!("post {id}"),
        "user": user(author, author),
        "likes_count": likes,
        "liked": liked,
        "reposts_count": 0,
        "reposted": false,
        "comments_count": 0,
        "views_count": 0,
        "created_at": "2024-05-01T12:00:00"
    })
}

pub(crate) fn comment_json(id: &str, author: &str, parent: Option<&str>) -> Value {
    json!({
        "id": id,
        "content": format!("comment {id}"),
        "parent_id": parent,
        "user": user(author, author),
        "likes_count": 0,
        "liked": false
    })
}

pub(crate) fn message_json(id: &str, from: &str, to: &str, content: &str) -> Value {
    json!({
        "id": id,
        "sender_id": from,
        "receiver_id": to,
        "content": content,
        "reply_to_id": null,
        "is_read": false,
        "is_pinned": false,
        "edited_at": null,
        "created_at": "2024-05-01T12:00:00"
    })
}
