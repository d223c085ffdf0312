//! Scripted HTTP backend
//!
//! Replays a queue of canned outcomes and records every request it sees,
//! so the transport and sync logic can be tested without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{HttpBackend, HttpRequest, HttpResponse};

/// Backend answering from a FIFO of scripted outcomes
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push(&self, response: HttpResponse) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(Ok(response));
        }
    }

    /// Queue an uncompressed response with the given status and body
    pub fn push_json(&self, status: u16, body: &str) {
        self.push(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        });
    }

    /// Queue a network-level failure
    pub fn push_error(&self, message: &str) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(Err(message.to_string()));
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Outcomes not consumed yet
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().map(|o| o.len()).unwrap_or_default()
    }
}

impl HttpBackend for ScriptedBackend {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        self.outcomes
            .lock()
            .map_err(|_| "scripted backend lock poisoned".to_string())?
            .pop_front()
            .unwrap_or_else(|| {
                Err(format!(
                    "no scripted response for {} {}",
                    request.method.as_str(),
                    request.url
                ))
            })
    }
}
