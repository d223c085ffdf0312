//! Purge: remove every document from the selected project

use log::info;

use super::ProjectSync;
use crate::api::Deletion;
use crate::error::Error;

/// Purge stopped before finishing
#[derive(Debug, thiserror::Error)]
#[error("purge stopped after {deleted} of {total} documents: {source}")]
pub struct PurgeError {
    /// Documents processed before the failure
    pub deleted: usize,
    /// Documents in the project when the purge started (0 if listing failed)
    pub total: usize,
    #[source]
    pub source: Error,
}

impl PurgeError {
    fn new(deleted: usize, total: usize, source: impl Into<Error>) -> Self {
        Self {
            deleted,
            total,
            source: source.into(),
        }
    }
}

impl ProjectSync {
    /// Delete every document in the project, in listing order
    ///
    /// `progress` receives (file name, 1-based position, total) before each
    /// deletion. Documents that are already gone count as deleted. On success
    /// the tracked-document pointer is cleared and the number of documents is
    /// returned.
    pub fn purge_project_files<F>(&self, mut progress: F) -> Result<usize, PurgeError>
    where
        F: FnMut(&str, usize, usize),
    {
        let scope = self.validate_config().map_err(|e| PurgeError::new(0, 0, e))?;
        let docs = self
            .api
            .list_documents(&scope)
            .map_err(|e| PurgeError::new(0, 0, e))?;
        let total = docs.len();

        for (index, doc) in docs.iter().enumerate() {
            progress(&doc.file_name, index + 1, total);

            match self.api.delete_document(&scope, &doc.id) {
                Ok(Deletion::Removed) => {}
                Ok(Deletion::AlreadyGone) => {
                    info!("{} was already deleted", doc.file_name);
                }
                Err(e) => return Err(PurgeError::new(index, total, e)),
            }
        }

        self.clear_tracked()
            .map_err(|e| PurgeError::new(total, total, e))?;

        info!("Purged {} documents", total);
        Ok(total)
    }
}
