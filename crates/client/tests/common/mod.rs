//! Common test utilities for client integration tests.
//!
//! Runs an in-process fake of the remote API on an ephemeral port. Responses
//! are scripted per `METHOD /path` and every request is recorded.

// Allow dead code in this module - not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use client::{ApiClient, ApiConfig};
use domain::models::user::UserProfile;
use domain::models::{Role, Session};
use serde_json::{json, Value};

/// Path prefix the fake API is mounted under.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct FakeState {
    responses: HashMap<String, (StatusCode, Value)>,
    requests: Vec<RecordedRequest>,
    delay: Option<Duration>,
}

/// Handle on a running fake API.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
    base_url: String,
}

impl FakeApi {
    /// Starts the fake API and returns a handle to it.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().unwrap();

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}{}", addr, API_PREFIX),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scripts the answer for `method path` (path without the API prefix).
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(format!("{} {}", method, path), (status, body));
    }

    /// Scripts a `200` envelope with `data`.
    pub fn respond_ok(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, StatusCode::OK, envelope_ok(data));
    }

    /// Delays every answer.
    pub fn delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("No request was recorded")
    }

    pub fn client(&self) -> ApiClient {
        self.client_with_timeout(2_000)
    }

    pub fn client_with_timeout(&self, timeout_ms: u64) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: self.base_url.clone(),
            timeout_ms,
        })
        .expect("Failed to build client")
    }
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    let (response, delay) = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
        let response = state
            .responses
            .get(&format!("{} {}", method, path))
            .cloned()
            .unwrap_or((
                StatusCode::NOT_FOUND,
                json!({"success": false, "message": "Not found"}),
            ));
        (response, state.delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    (response.0, Json(response.1))
}

pub fn envelope_ok(data: Value) -> Value {
    json!({"success": true, "data": data})
}

pub fn envelope_failure(message: &str) -> Value {
    json!({"success": false, "message": message})
}

pub fn profile(id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: id.into(),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        email: format!("{id}@example.com"),
        role: Some(role),
        track_id: None,
    }
}

pub fn staff_session() -> Session {
    Session::authenticated("staff-token", profile("u1", Role::Staff))
}

pub fn admin_session() -> Session {
    Session::authenticated("admin-token", profile("a1", Role::Admin))
}

/// A record as the server would return it.
pub fn record_json(user_id: &str, date: &str, check_out: Option<&str>, status: &str) -> Value {
    json!({
        "id": format!("rec-{user_id}-{date}"),
        "userId": user_id,
        "date": date,
        "checkInTime": format!("{date}T08:55:00Z"),
        "checkOutTime": check_out,
        "status": status,
        "latitude": 5.11883,
        "longitude": 7.36927
    })
}
