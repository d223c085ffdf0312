//! Session credential handling
//!
//! The session key is a cookie issued by claude.ai. It is stored once per
//! host (not per sync target) and the server may rotate it on any response.

use config::ConfigStore;
use log::info;
use std::sync::Arc;

use super::HttpResponse;
use crate::error::Result;

/// Config key holding the session cookie value
pub const SESSION_KEY: &str = "claude.session_key";

/// Cookie name used by claude.ai
const COOKIE_NAME: &str = "sessionKey";

/// Access to the shared session credential
///
/// Wraps the host-wide credential store; the transport reads the cookie from
/// it before every attempt and writes rotated values back.
#[derive(Clone)]
pub struct SessionCredential {
    store: Arc<dyn ConfigStore>,
}

impl SessionCredential {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Current credential, if one has been stored
    pub fn current(&self) -> Option<String> {
        self.store.get(SESSION_KEY)
    }

    pub fn is_present(&self) -> bool {
        self.store.has(SESSION_KEY)
    }

    /// Replace the stored credential
    pub fn replace(&self, value: &str) -> Result<()> {
        self.store.set(SESSION_KEY, value)?;
        Ok(())
    }

    /// Value for the `Cookie` request header
    pub fn cookie_header(&self) -> String {
        format!("{}={}", COOKIE_NAME, self.current().unwrap_or_default())
    }

    /// Persist a rotated credential carried by `response`.
    ///
    /// Returns true when the stored value changed.
    pub fn refresh_from(&self, response: &HttpResponse) -> Result<bool> {
        let Some(new_value) = response
            .header_values("set-cookie")
            .find_map(parse_session_cookie)
        else {
            return Ok(false);
        };

        if self.current().as_deref() == Some(new_value) {
            return Ok(false);
        }

        self.replace(new_value)?;
        info!("Session key rotated by server");
        Ok(true)
    }
}

/// Extract the value of a `sessionKey=...; attrs` Set-Cookie header
fn parse_session_cookie(header: &str) -> Option<&str> {
    let rest = header.strip_prefix(COOKIE_NAME)?.strip_prefix('=')?;
    let value = rest.split(';').next()?;
    (!value.is_empty()).then_some(value)
}
