//! Repository models

use serde::{Deserialize, Serialize};

/// License summary attached to a repository listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub key: String,
}

/// Metadata for one remote repository, as returned by the forge listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Qualified `owner/name`
    #[serde(rename = "full_name")]
    pub name: String,
    pub ssh_url: String,
    pub default_branch: String,
    #[serde(default)]
    pub license: Option<LicenseInfo>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
}

impl RepositoryRecord {
    /// Short license key, if the forge detected one
    pub fn license_key(&self) -> Option<&str> {
        self.license.as_ref().map(|l| l.key.as_str())
    }
}

/// Handle to an on-disk clone of a [`RepositoryRecord`]
#[derive(Debug, Clone)]
pub struct LocalRepository {
    pub name: String,
    pub path: std::path::PathBuf,
    pub branch: String,
}
