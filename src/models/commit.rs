//! Commit models

use serde::{Deserialize, Serialize};

/// Fixed message of every license commit
pub const COMMIT_MESSAGE: &str =
    "copyright-waiver: Update license to a public-domain-equivalent license";

/// Explicit author/committer identity used for license commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Build a git2 signature stamped with the current time
    pub fn signature(&self) -> Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::now(&self.name, &self.email)
    }
}
