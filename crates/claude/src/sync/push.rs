//! Push: replace the tracked document with local content

use log::info;
use std::path::Path;

use super::{ProjectSync, content_hash, keys};
use crate::api::{Deletion, Scope};
use crate::error::{Error, Result};

/// What a push did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Content matched the last upload; nothing was sent
    Unchanged { document_id: String },
    /// A new document was uploaded
    Uploaded {
        document_id: String,
        /// Document that was deleted to make room, if any
        replaced: Option<String>,
    },
}

impl ProjectSync {
    /// Upload `local_file` to the project as `remote_name`
    ///
    /// Skips the upload when the content hash matches the tracked document.
    /// Otherwise any existing document (tracked, or found by name) is deleted
    /// and the content uploaded as a new document.
    pub fn push(&self, local_file: &Path, remote_name: &str) -> Result<PushOutcome> {
        let scope = self.validate_config()?;

        let content = std::fs::read(local_file).map_err(|source| Error::ReadFile {
            path: local_file.to_path_buf(),
            source,
        })?;

        self.push_scoped(&scope, &content, remote_name)
    }

    /// Same as [`push`](Self::push) for content already in memory
    pub fn push_content(&self, content: &[u8], remote_name: &str) -> Result<PushOutcome> {
        let scope = self.validate_config()?;
        self.push_scoped(&scope, content, remote_name)
    }

    fn push_scoped(&self, scope: &Scope, content: &[u8], remote_name: &str) -> Result<PushOutcome> {
        let hash = content_hash(content);
        let tracked = self.tracked_document();

        if tracked.is_current(&hash)
            && let Some(document_id) = tracked.document_id.clone()
        {
            info!("Content unchanged, skipping upload of {}", remote_name);
            return Ok(PushOutcome::Unchanged { document_id });
        }

        // Adopt a same-named document created elsewhere; it is deleted, not tracked
        let mut existing = tracked.document_id;
        if existing.is_none() {
            existing = self
                .api
                .list_documents(scope)?
                .into_iter()
                .find(|doc| doc.file_name == remote_name)
                .map(|doc| doc.id);
            if let Some(id) = &existing {
                info!("Found existing document {} for {}", id, remote_name);
            }
        }

        if let Some(id) = &existing {
            if self.api.delete_document(scope, id)? == Deletion::AlreadyGone {
                info!("Document {} was already deleted", id);
            }
            self.target().delete(keys::DOCUMENT_ID)?;
        }

        let text = String::from_utf8_lossy(content);
        let document = self.api.create_document(scope, remote_name, &text)?;

        self.target().set_many(&[
            (keys::DOCUMENT_ID, document.id.as_str()),
            (keys::CONTENT_HASH, hash.as_str()),
        ])?;

        info!("Uploaded {} as document {}", remote_name, document.id);
        Ok(PushOutcome::Uploaded {
            document_id: document.id,
            replaced: existing,
        })
    }
}
