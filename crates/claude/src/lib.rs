//! Claude crate - sync a local file into a claude.ai project
//!
//! This crate provides:
//! - A retrying HTTP transport that handles gzip bodies and session key rotation
//! - Typed accessors for organizations, projects and project documents
//! - Content-addressed push (skip unchanged, replace changed) and purge
//! - Setup and validation of the session key and project selection
//!
//! Persistence goes through `config::ConfigStore`. Two stores are used: a
//! host-wide one for the session key and one per sync target for the scope
//! and the tracked document.

pub mod api;
pub mod config;
pub mod error;
pub mod setup;
pub mod sync;
pub mod transport;

pub use api::{ClaudeApi, Deletion, Document, Organization, Project, Scope};
pub use self::config::{ClientConfig, RetryPolicy};
pub use error::{Error, Result};
pub use setup::{Prompter, SelectableItem, SetupOutcome};
pub use sync::{ProjectSync, PurgeError, PushOutcome, TrackedDocument, content_hash, keys};
pub use transport::{
    ACCEPT_ENCODING, HttpBackend, HttpRequest, HttpResponse, Method, SESSION_KEY, ScriptedBackend,
    SessionCredential, Transport, UreqBackend,
};

use std::sync::Arc;

/// Build a sync client over the real API
///
/// `credentials` holds the host-wide session key, `target` the per-target
/// scope and tracked document.
pub fn connect(
    config: &ClientConfig,
    credentials: Arc<dyn ::config::ConfigStore>,
    target: Arc<dyn ::config::ConfigStore>,
) -> Result<ProjectSync> {
    config.validate()?;
    let transport = Transport::with_ureq(SessionCredential::new(credentials), config);
    Ok(ProjectSync::new(ClaudeApi::new(transport), target))
}
