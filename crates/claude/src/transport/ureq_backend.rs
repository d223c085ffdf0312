//! HTTP backend built on ureq
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. TLS goes through
//! rustls, which does not negotiate anything older than TLS 1.2.

use ureq::{Agent, RequestBuilder};

use super::{HttpBackend, HttpRequest, HttpResponse, Method};
use crate::config::ClientConfig;

/// Production backend
pub struct UreqBackend {
    agent: Agent,
}

impl UreqBackend {
    pub fn new(config: &ClientConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(config.connect_timeout()))
            // Per attempt; retries get a fresh budget
            .timeout_global(Some(config.request_timeout()))
            // Statuses are classified by the transport, not raised here
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl HttpBackend for UreqBackend {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let url = request.url.as_str();
        let result = match request.method {
            Method::Get => with_headers(self.agent.get(url), &request.headers).call(),
            Method::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            Method::Post => with_headers(self.agent.post(url), &request.headers)
                .send(request.body.as_deref().unwrap_or_default()),
        };

        let mut response = result.map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| format!("failed to read response body: {}", e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |builder, (name, value)| {
            builder.header(name.as_str(), value.as_str())
        })
}
