//! Typed calls against the claude.ai REST resources

use log::debug;
use serde::de::DeserializeOwned;

use super::{Document, NewDocument, Organization, Project, Scope};
use crate::error::{Error, Result};
use crate::transport::{SessionCredential, Transport};

/// Result of deleting a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Removed,
    /// The server answered 404; the document was already gone
    AlreadyGone,
}

/// claude.ai API client
pub struct ClaudeApi {
    transport: Transport,
}

impl ClaudeApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn session(&self) -> &SessionCredential {
        self.transport.session()
    }

    /// List organizations visible to the session
    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let data = self
            .transport
            .get("/organizations")
            .map_err(Error::during("list organizations"))?;
        parse(&data, "organizations")
    }

    /// List projects of an organization, archived ones included
    pub fn list_projects(&self, organization_id: &str) -> Result<Vec<Project>> {
        let path = format!("/organizations/{}/projects", segment(organization_id));
        let data = self
            .transport
            .get(&path)
            .map_err(Error::during("list projects"))?;
        parse(&data, "projects")
    }

    /// List documents of the scoped project
    pub fn list_documents(&self, scope: &Scope) -> Result<Vec<Document>> {
        let data = self
            .transport
            .get(&docs_path(scope))
            .map_err(Error::during("list documents"))?;
        parse(&data, "documents")
    }

    /// Upload a new document to the scoped project
    pub fn create_document(&self, scope: &Scope, file_name: &str, content: &str) -> Result<Document> {
        debug!("Uploading {} ({} bytes)", file_name, content.len());
        let body = NewDocument { file_name, content };
        let data = self
            .transport
            .post_json(&docs_path(scope), &body)
            .map_err(Error::during("upload document"))?;
        parse(&data, "document")
    }

    /// Delete a document from the scoped project
    ///
    /// A 404 means someone else already removed it and is reported as
    /// [`Deletion::AlreadyGone`] rather than an error.
    pub fn delete_document(&self, scope: &Scope, document_id: &str) -> Result<Deletion> {
        let path = format!("{}/{}", docs_path(scope), segment(document_id));
        match self.transport.delete(&path) {
            Ok(_) => Ok(Deletion::Removed),
            Err(e) if e.is_not_found() => {
                debug!("Document {} already deleted", document_id);
                Ok(Deletion::AlreadyGone)
            }
            Err(e) => Err(Error::during("delete document")(e)),
        }
    }
}

fn docs_path(scope: &Scope) -> String {
    format!(
        "/organizations/{}/projects/{}/docs",
        segment(&scope.organization_id),
        segment(&scope.project_id)
    )
}

/// Percent-encode an identifier used as a path segment
fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

fn parse<T: DeserializeOwned>(data: &[u8], what: &'static str) -> Result<T> {
    serde_json::from_slice(data).map_err(|source| Error::Parse { what, source })
}
