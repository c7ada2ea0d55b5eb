//! Error types for copyright-waiver

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum WaiverError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to list repositories: {0}")]
    Listing(String),

    #[error("Failed to resolve license text: {0}")]
    Resolution(String),

    #[error("Clone of {repo} failed: {message}")]
    Clone { repo: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Push of {repo} failed: {message}")]
    Push { repo: String, message: String },

    #[error("Nothing to commit in {0}")]
    NothingToCommit(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl WaiverError {
    /// Stable machine-readable code for logs and the run summary
    pub fn code(&self) -> &'static str {
        match self {
            WaiverError::Git(_) => "GIT_ERROR",
            WaiverError::Io(_) => "IO_ERROR",
            WaiverError::Serialization(_) => "SERIALIZATION_ERROR",
            WaiverError::Http(_) => "HTTP_ERROR",
            WaiverError::Config(_) => "CONFIG_ERROR",
            WaiverError::Auth(_) => "AUTH_ERROR",
            WaiverError::Listing(_) => "LISTING_ERROR",
            WaiverError::Resolution(_) => "RESOLUTION_ERROR",
            WaiverError::Clone { .. } => "CLONE_ERROR",
            WaiverError::Cancelled => "CANCELLED",
            WaiverError::Push { .. } => "PUSH_ERROR",
            WaiverError::NothingToCommit(_) => "NOTHING_TO_COMMIT",
            WaiverError::Workspace(_) => "WORKSPACE_ERROR",
            WaiverError::OperationFailed(_) => "OPERATION_FAILED",
        }
    }

    /// Whether this error should stop the remaining repositories from being
    /// processed. Credentials are shared by every repository, so an
    /// authentication failure on one will fail them all.
    pub fn aborts_run(&self) -> bool {
        matches!(self, WaiverError::Auth(_) | WaiverError::Cancelled)
    }
}

/// Result type alias for copyright-waiver operations
pub type Result<T> = std::result::Result<T, WaiverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_stage_errors() {
        let clone = WaiverError::Clone {
            repo: "me/a".to_string(),
            message: "boom".to_string(),
        };
        let push = WaiverError::Push {
            repo: "me/a".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(clone.code(), "CLONE_ERROR");
        assert_eq!(push.code(), "PUSH_ERROR");
        assert_eq!(WaiverError::Cancelled.code(), "CANCELLED");
    }

    #[test]
    fn test_auth_and_cancel_abort_run() {
        assert!(WaiverError::Auth("bad key".to_string()).aborts_run());
        assert!(WaiverError::Cancelled.aborts_run());
        assert!(!WaiverError::NothingToCommit("me/a".to_string()).aborts_run());
        assert!(!WaiverError::Clone {
            repo: "me/a".to_string(),
            message: "not found".to_string(),
        }
        .aborts_run());
    }

    #[test]
    fn test_display_includes_repository() {
        let err = WaiverError::Push {
            repo: "me/a".to_string(),
            message: "rejected".to_string(),
        };
        assert_eq!(err.to_string(), "Push of me/a failed: rejected");
    }
}
