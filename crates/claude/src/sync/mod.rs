//! Document sync for a single target
//!
//! A sync target (usually a project directory) keeps its own store with the
//! selected organization/project and a pointer to the document it last
//! uploaded. The session key lives in a separate, host-wide store reached
//! through the transport.

mod purge;
mod push;

pub use purge::PurgeError;
pub use push::PushOutcome;

use config::ConfigStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::api::{ClaudeApi, Scope};
use crate::error::{Error, Result};
use crate::transport::SESSION_KEY;

/// Config keys stored per sync target
pub mod keys {
    pub const ORGANIZATION_ID: &str = "claude.organization_id";
    pub const PROJECT_ID: &str = "claude.project_id";
    pub const DOCUMENT_ID: &str = "claude.document_id";
    /// SHA-256 (hex) of the last uploaded content
    pub const CONTENT_HASH: &str = "claude.content_hash";
}

/// Pointer to the last document pushed from this target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedDocument {
    pub document_id: Option<String>,
    pub content_hash: Option<String>,
}

impl TrackedDocument {
    fn load(store: &dyn ConfigStore) -> Self {
        Self {
            document_id: store.get(keys::DOCUMENT_ID),
            content_hash: store.get(keys::CONTENT_HASH),
        }
    }

    /// True when `hash` is already on the server under a known document
    pub fn is_current(&self, hash: &str) -> bool {
        self.document_id.is_some() && self.content_hash.as_deref() == Some(hash)
    }
}

/// Sync client bound to one target store
pub struct ProjectSync {
    api: ClaudeApi,
    target: Arc<dyn ConfigStore>,
}

impl ProjectSync {
    pub fn new(api: ClaudeApi, target: Arc<dyn ConfigStore>) -> Self {
        Self { api, target }
    }

    pub fn api(&self) -> &ClaudeApi {
        &self.api
    }

    pub(crate) fn target(&self) -> &dyn ConfigStore {
        self.target.as_ref()
    }

    /// Current tracked-document pointer
    pub fn tracked_document(&self) -> TrackedDocument {
        TrackedDocument::load(self.target.as_ref())
    }

    /// Ensure the session key and scope are configured
    ///
    /// Fails with every missing key, not just the first one.
    pub fn validate_config(&self) -> Result<Scope> {
        let mut missing = Vec::new();
        if !self.api.session().is_present() {
            missing.push(SESSION_KEY.to_string());
        }

        let organization_id = self.target.get(keys::ORGANIZATION_ID);
        let project_id = self.target.get(keys::PROJECT_ID);
        if organization_id.is_none() {
            missing.push(keys::ORGANIZATION_ID.to_string());
        }
        if project_id.is_none() {
            missing.push(keys::PROJECT_ID.to_string());
        }

        match (organization_id, project_id) {
            (Some(org), Some(project)) if missing.is_empty() => Ok(Scope::new(org, project)),
            _ => Err(Error::ConfigIncomplete(missing)),
        }
    }

    /// Drop the tracked-document pointer
    pub(crate) fn clear_tracked(&self) -> Result<()> {
        self.target.delete(keys::DOCUMENT_ID)?;
        self.target.delete(keys::CONTENT_HASH)?;
        Ok(())
    }
}

/// Hex-encoded SHA-256 of `content`
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}
