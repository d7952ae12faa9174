//! Recording transport for tests. Replies are canned per method and path.

use crate::client::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::MaileonError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    Fail(String),
}

/// Mock transport that records every request and replays queued responses.
///
/// Replies for a `(method, path)` pair are consumed in order; the last one
/// stays in place and answers every further request. Requests with no
/// reply configured get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<(Method, String), VecDeque<Reply>>>>,
    /// Track calls for verification
    pub call_log: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a response; non-2xx statuses surface as `MaileonError::Api`
    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.push(method, path, Reply::Status(status, body.into()));
    }

    /// Queue a transport-level failure
    pub fn fail(&self, method: Method, path: &str, message: impl Into<String>) {
        self.push(method, path, Reply::Fail(message.into()));
    }

    /// Get a copy of the call log for assertions
    pub fn get_calls(&self) -> Vec<ApiRequest> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.get_calls()
            .into_iter()
            .filter(|r| r.method == method && r.path() == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls_to(method, path).len()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear();
    }

    fn next_reply(&self, method: Method, path: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MaileonError> {
        let reply = self.next_reply(request.method, request.path());
        self.call_log.lock().unwrap().push(request);

        match reply {
            Some(Reply::Status(status, body)) if (200..300).contains(&status) => {
                Ok(ApiResponse::new(status, body))
            }
            Some(Reply::Status(status, body)) => Err(MaileonError::Api { status, body }),
            Some(Reply::Fail(message)) => Err(MaileonError::Http {
                message,
                source: None,
            }),
            None => Err(MaileonError::Api {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}
