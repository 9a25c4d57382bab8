//! Fixtures and a scripted transport shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::api::{ApiClient, ApiError, ApiRequest, ApiResult, Method, RawResponse, Transport};
use crate::models::{Faculty, Student};
use crate::session::{MemoryStorage, SessionStore};

pub fn student(id: i64) -> Student {
    Student {
        id,
        name: "Anika".to_string(),
        email: "anika@college.edu".to_string(),
        faculty_id: None,
        class_id: None,
        is_registered: Some(false),
    }
}

pub fn faculty(id: i64) -> Faculty {
    Faculty {
        id,
        name: "Dr. Menon".to_string(),
        email: "menon@college.edu".to_string(),
        faculty_id: None,
        faculty_name: None,
        faculty_email: None,
        is_registered: Some(false),
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Answer(RawResponse),
    Unreachable(String),
    Hang,
    Gated(Arc<Notify>, RawResponse),
}

/// Transport that answers from a script and records every request.
///
/// Replies queued for the same route are used in order; the last one
/// keeps answering. Unscripted routes get a 404.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(
            method,
            path,
            Reply::Answer(RawResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn unreachable(&self, method: Method, path: &str) {
        self.push(method, path, Reply::Unreachable("connection refused".to_string()));
    }

    /// The request never completes
    pub fn hang(&self, method: Method, path: &str) {
        self.push(method, path, Reply::Hang);
    }

    /// Answer only after the returned gate is opened with `notify_one`
    pub fn gate(&self, method: Method, path: &str, status: u16, body: serde_json::Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            method,
            path,
            Reply::Gated(
                gate.clone(),
                RawResponse {
                    status,
                    body: body.to_string(),
                },
            ),
        );
        gate
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, method: &Method, path: &str) -> Option<Reply> {
        let mut replies = self.replies.lock();
        let queue = replies.get_mut(&(method.clone(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        let reply = self.next_reply(&request.method, &request.path);
        self.calls.lock().push(request);
        match reply {
            Some(Reply::Answer(response)) => Ok(response),
            Some(Reply::Unreachable(message)) => Err(ApiError::Transport(message)),
            Some(Reply::Hang) => futures::future::pending().await,
            Some(Reply::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Ok(RawResponse {
                status: 404,
                body: r#"{"detail":"Not Found"}"#.to_string(),
            }),
        }
    }
}

pub fn anonymous(transport: &Arc<FakeTransport>) -> ApiClient {
    let session = Arc::new(SessionStore::restored(MemoryStorage::new()));
    ApiClient::new(transport.clone(), session)
}

/// Client whose session holds `faculty(2)`, fully registered
pub fn signed_in_faculty(transport: &Arc<FakeTransport>) -> ApiClient {
    let api = anonymous(transport);
    api.session()
        .login_faculty(faculty(2), true, "f-token")
        .expect("memory storage never fails");
    api
}

pub fn signed_in_student(transport: &Arc<FakeTransport>, student: Student) -> ApiClient {
    let api = anonymous(transport);
    let fully_registered = student.is_registered();
    api.session()
        .login_student(student, fully_registered, "s-token")
        .expect("memory storage never fails");
    api
}
