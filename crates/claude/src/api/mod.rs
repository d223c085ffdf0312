//! claude.ai resource accessors
//!
//! Thin typed wrappers over the transport for organizations, projects and
//! project documents.

mod client;

pub use client::{ClaudeApi, Deletion};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization the session has access to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    #[serde(rename = "uuid")]
    pub id: String,
    pub name: String,
}

/// A project inside an organization
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    #[serde(rename = "uuid")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Archived projects cannot be synced to
    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}

/// A document in a project's knowledge base
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    #[serde(rename = "uuid")]
    pub id: String,
    pub file_name: String,
}

/// Body of a document upload
#[derive(Debug, Serialize)]
pub(crate) struct NewDocument<'a> {
    pub file_name: &'a str,
    pub content: &'a str,
}

/// The (organization, project) pair all document operations are bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub organization_id: String,
    pub project_id: String,
}

impl Scope {
    pub fn new(organization_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            project_id: project_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_deserialization() {
        let json = r#"[
            {"uuid": "p1", "name": "Active", "archived_at": null, "is_private": true},
            {"uuid": "p2", "name": "Old", "archived_at": "2024-05-01T12:30:00.000000+00:00"},
            {"uuid": "p3", "name": "No field"}
        ]"#;

        let projects: Vec<Project> = serde_json::from_str(json).unwrap();
        assert_eq!(projects.len(), 3);
        assert!(projects[0].is_active());
        assert!(!projects[1].is_active());
        assert!(projects[2].is_active());
    }

    #[test]
    fn test_document_deserialization() {
        let json = r#"{"uuid": "d1", "file_name": "context.txt", "content": "ignored", "created_at": "x"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.file_name, "context.txt");
    }

    #[test]
    fn test_new_document_serialization() {
        let body = NewDocument {
            file_name: "context.txt",
            content: "hello",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "file_name": "context.txt", "content": "hello" }));
    }
}
