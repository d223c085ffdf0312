//! Error types for the sync client

use std::path::PathBuf;

/// Errors produced by the transport, the resource accessors and the sync logic
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration keys are missing (all of them are listed)
    #[error("missing required config keys: {}", .0.join(", "))]
    ConfigIncomplete(Vec<String>),

    /// Network-level failure or timeout
    #[error("request failed: {0}")]
    Transport(String),

    /// 5xx or 429 response
    #[error("API request failed: {status} - {body}")]
    Server { status: u16, body: String },

    /// Any other non-2xx response
    #[error("API request failed: {status} - {body}")]
    Client { status: u16, body: String },

    /// Response body could not be decompressed
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// Every attempt failed with a retryable error
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    /// A successful response carried JSON we could not understand
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A resource call failed; `operation` names the call
    #[error("{operation}: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to read file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("selection {index} is out of range (1-{len})")]
    InvalidSelection { index: usize, len: usize },

    /// Failure reported by a collaborator (config store, prompter)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an error with the name of the operation that produced it
    pub(crate) fn during(operation: &'static str) -> impl FnOnce(Error) -> Error {
        move |source| Error::Request {
            operation,
            source: Box::new(source),
        }
    }

    /// HTTP status carried by this error, looking through operation context
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } | Error::Client { status, .. } => Some(*status),
            Error::Request { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True for a 404 response, looking through operation context
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the transport should try the request again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Server { .. } | Error::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_incomplete_lists_every_key() {
        let err = Error::ConfigIncomplete(vec![
            "claude.session_key".to_string(),
            "claude.project_id".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required config keys: claude.session_key, claude.project_id"
        );
    }

    #[test]
    fn test_not_found_through_context() {
        let err = Error::during("delete document")(Error::Client {
            status: 404,
            body: "not found".to_string(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "delete document: API request failed: 404 - not found");

        let err = Error::during("delete document")(Error::Client {
            status: 403,
            body: String::new(),
        });
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_exhausted_is_not_retryable() {
        let err = Error::RetriesExhausted {
            attempts: 3,
            last: Box::new(Error::Server {
                status: 500,
                body: "boom".to_string(),
            }),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("after 3 attempts"));
        assert_eq!(err.status(), None);
    }
}
