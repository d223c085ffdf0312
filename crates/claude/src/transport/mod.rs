//! HTTP transport for the claude.ai API
//!
//! One logical request at a time, with:
//! - fixed browser-like headers and the session cookie
//! - retry with exponential backoff for network errors, 5xx and 429
//! - manual gzip decoding of response bodies
//! - session key rotation from `Set-Cookie`
//!
//! The HTTP engine sits behind [`HttpBackend`] so the retry and session logic
//! can be exercised without a network.

mod scripted;
mod session;
mod ureq_backend;

pub use scripted::ScriptedBackend;
pub use session::{SESSION_KEY, SessionCredential};
pub use ureq_backend::UreqBackend;

use flate2::read::GzDecoder;
use log::{debug, warn};
use std::io::Read;
use std::sync::Arc;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{Error, Result};

/// Accept-Encoding value the API insists on.
///
/// Under load claude.ai answers 403 unless the client states this exact
/// preference; plain `gzip` is not enough.
pub const ACCEPT_ENCODING: &str = "gzip;q=1.0, identity;q=0.3";

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully prepared request, handed to the backend once per attempt
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First value of header `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response with its raw (possibly compressed) body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of header `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).next()
    }

    /// All values of header `name` (case-insensitive), in order
    pub fn header_values<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a single HTTP exchange
///
/// Returns `Err` only when no response was received (connection failure,
/// timeout, unreadable body). Non-2xx statuses are returned as responses.
pub trait HttpBackend: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, String>;
}

/// Retrying, session-aware request executor
pub struct Transport {
    backend: Arc<dyn HttpBackend>,
    session: SessionCredential,
    api_root: String,
    user_agent: String,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        session: SessionCredential,
        config: &ClientConfig,
    ) -> Self {
        Self {
            backend,
            session,
            api_root: config.api_root().to_string(),
            user_agent: config.user_agent.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Transport over a real HTTP client
    pub fn with_ureq(session: SessionCredential, config: &ClientConfig) -> Self {
        Self::new(Arc::new(UreqBackend::new(config)), session, config)
    }

    pub fn session(&self) -> &SessionCredential {
        &self.session
    }

    pub fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.send(Method::Get, path, None)
    }

    pub fn delete(&self, path: &str) -> Result<Vec<u8>> {
        self.send(Method::Delete, path, None)
    }

    pub fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(body).map_err(|source| Error::Parse {
            what: "request body",
            source,
        })?;
        self.send(Method::Post, path, Some(body))
    }

    /// Send a request, retrying transient failures
    ///
    /// Returns the decoded body of the first 2xx response.
    pub fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.api_root, path);
        let max_attempts = self.retry.attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_before_retry(attempt - 1);
                debug!("Retrying {} {} in {:?}", method.as_str(), path, delay);
                std::thread::sleep(delay);
            }

            debug!(
                "{} {} (attempt {}/{})",
                method.as_str(),
                path,
                attempt,
                max_attempts
            );

            // Rebuilt per attempt so a rotated session key is picked up
            let request = self.build_request(method, &url, body.clone());

            match self.attempt(&request) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() => {
                    warn!(
                        "{} {} failed (attempt {}/{}): {}",
                        method.as_str(),
                        path,
                        attempt,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let last = last_error.unwrap_or_else(|| Error::Transport("no attempt was made".to_string()));
        Err(Error::RetriesExhausted {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }

    /// One exchange: execute, refresh the session, decode, check status
    fn attempt(&self, request: &HttpRequest) -> Result<Vec<u8>> {
        let response = self.backend.execute(request).map_err(Error::Transport)?;

        // The server may rotate the key on error responses too
        self.session.refresh_from(&response)?;

        let body = decode_body(&response)?;
        let status = response.status;

        if response.is_success() {
            return Ok(body);
        }

        let body = String::from_utf8_lossy(&body).into_owned();
        if status >= 500 || status == 429 {
            Err(Error::Server { status, body })
        } else {
            Err(Error::Client { status, body })
        }
    }

    fn build_request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), self.user_agent.clone()),
                ("Accept-Encoding".to_string(), ACCEPT_ENCODING.to_string()),
                ("Cookie".to_string(), self.session.cookie_header()),
            ],
            body,
        }
    }
}

/// Decode the response body according to `Content-Encoding`
fn decode_body(response: &HttpResponse) -> Result<Vec<u8>> {
    let gzipped = response
        .header("content-encoding")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));

    if !gzipped {
        return Ok(response.body.clone());
    }

    let mut decoded = Vec::new();
    GzDecoder::new(response.body.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|e| Error::Decode(format!("invalid gzip body: {}", e)))?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{ConfigStore, MemoryStore};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn setup(backend: Arc<ScriptedBackend>) -> (Transport, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_entries([(SESSION_KEY, "sk-old")]));
        let config = ClientConfig {
            base_url: "https://claude.test/api".to_string(),
            retry: RetryPolicy::immediate(3),
            ..ClientConfig::default()
        };
        let transport = Transport::new(backend, SessionCredential::new(store.clone()), &config);
        (transport, store)
    }

    #[test]
    fn test_fixed_headers() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(200, "[]");
        let (transport, _) = setup(backend.clone());

        transport.get("/organizations").unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "https://claude.test/api/organizations");
        assert_eq!(
            request.header("Accept-Encoding"),
            Some("gzip;q=1.0, identity;q=0.3")
        );
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Cookie"), Some("sessionKey=sk-old"));
        assert!(request.header("User-Agent").unwrap().starts_with("Mozilla/5.0"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_post_serializes_body() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(201, r#"{"uuid":"d1","file_name":"a.txt"}"#);
        let (transport, _) = setup(backend.clone());

        transport
            .post_json("/docs", &serde_json::json!({ "file_name": "a.txt" }))
            .unwrap();

        let request = &backend.requests()[0];
        assert_eq!(request.method, Method::Post);
        let sent: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(sent["file_name"], "a.txt");
    }

    #[test]
    fn test_retries_server_errors_then_succeeds() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(500, "oops");
        backend.push_json(500, "oops");
        backend.push_json(200, "ok");
        let (transport, _) = setup(backend.clone());

        let body = transport.get("/organizations").unwrap();

        assert_eq!(body, b"ok");
        assert_eq!(backend.request_count(), 3);
    }

    #[test]
    fn test_exhausted_retries_report_attempt_count() {
        let backend = Arc::new(ScriptedBackend::new());
        for _ in 0..3 {
            backend.push_json(500, "still broken");
        }
        let (transport, _) = setup(backend.clone());

        let err = transport.get("/organizations").unwrap_err();

        assert_eq!(backend.request_count(), 3);
        match &err {
            Error::RetriesExhausted { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert_eq!(last.status(), Some(500));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_rate_limit_and_network_errors_are_retried() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(429, "slow down");
        backend.push_error("connection reset");
        backend.push_json(200, "[]");
        let (transport, _) = setup(backend.clone());

        assert!(transport.get("/organizations").is_ok());
        assert_eq!(backend.request_count(), 3);
    }

    #[test]
    fn test_client_errors_fail_immediately() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(403, "forbidden");
        backend.push_json(200, "[]");
        let (transport, _) = setup(backend.clone());

        let err = transport.get("/organizations").unwrap_err();

        assert_eq!(backend.request_count(), 1);
        assert!(matches!(err, Error::Client { status: 403, .. }));
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(HttpResponse {
            status: 200,
            headers: vec![("Content-Encoding".to_string(), "gzip".to_string())],
            body: gzip(br#"[{"uuid":"o1","name":"Org"}]"#),
        });
        let (transport, _) = setup(backend);

        let body = transport.get("/organizations").unwrap();
        assert_eq!(body, br#"[{"uuid":"o1","name":"Org"}]"#);
    }

    #[test]
    fn test_corrupt_gzip_counts_against_retry_budget() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(HttpResponse {
            status: 200,
            headers: vec![("content-encoding".to_string(), "gzip".to_string())],
            body: b"definitely not gzip".to_vec(),
        });
        backend.push_json(200, "[]");
        let (transport, _) = setup(backend.clone());

        assert_eq!(transport.get("/organizations").unwrap(), b"[]");
        assert_eq!(backend.request_count(), 2);
    }

    #[test]
    fn test_session_rotation_applies_to_next_request() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(HttpResponse {
            status: 200,
            headers: vec![(
                "set-cookie".to_string(),
                "sessionKey=NEWVAL; Path=/; Secure; HttpOnly".to_string(),
            )],
            body: b"[]".to_vec(),
        });
        backend.push_json(200, "[]");
        let (transport, store) = setup(backend.clone());

        transport.get("/organizations").unwrap();
        assert_eq!(store.get(SESSION_KEY).as_deref(), Some("NEWVAL"));

        transport.get("/organizations").unwrap();
        let requests = backend.requests();
        assert_eq!(requests[0].header("Cookie"), Some("sessionKey=sk-old"));
        assert_eq!(requests[1].header("Cookie"), Some("sessionKey=NEWVAL"));
    }

    #[test]
    fn test_session_rotation_on_error_response() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(HttpResponse {
            status: 503,
            headers: vec![("Set-Cookie".to_string(), "sessionKey=ROTATED".to_string())],
            body: b"unavailable".to_vec(),
        });
        backend.push_json(200, "[]");
        let (transport, store) = setup(backend.clone());

        transport.get("/organizations").unwrap();

        assert_eq!(store.get(SESSION_KEY).as_deref(), Some("ROTATED"));
        assert_eq!(
            backend.requests()[1].header("Cookie"),
            Some("sessionKey=ROTATED")
        );
    }

    #[test]
    fn test_session_rotation_on_non_retryable_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(HttpResponse {
            status: 403,
            headers: vec![("Set-Cookie".to_string(), "sessionKey=X; Path=/".to_string())],
            body: b"forbidden".to_vec(),
        });
        let (transport, store) = setup(backend);

        assert!(transport.get("/organizations").is_err());
        assert_eq!(store.get(SESSION_KEY).as_deref(), Some("X"));
    }

    #[test]
    fn test_session_rotation_on_final_failed_attempt() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(500, "oops");
        backend.push_json(500, "oops");
        backend.push(HttpResponse {
            status: 500,
            headers: vec![("Set-Cookie".to_string(), "sessionKey=LAST".to_string())],
            body: b"oops".to_vec(),
        });
        let (transport, store) = setup(backend);

        let err = transport.get("/organizations").unwrap_err();

        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(store.get(SESSION_KEY).as_deref(), Some("LAST"));
    }

    #[test]
    fn test_header_lookup_outlives_name() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Encoding".to_string(), "gzip".to_string())],
            body: Vec::new(),
        };
        let value = {
            let name = String::from("content-encoding");
            response.header(&name)
        };
        assert_eq!(value, Some("gzip"));
    }
}
