//! Run configuration
//!
//! Values come from the command line (with environment fallbacks), then an
//! optional JSON settings file, then built-in defaults.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WaiverError};
use crate::models::{CommitIdentity, DEFAULT_LICENSE_KEY};
use crate::services::forge::GITHUB_API_BASE;
use crate::services::workspace::Workspace;

const CONFIG_DIR: &str = "copyright-waiver";
const CONFIG_FILE: &str = "config.json";

/// Replace the license of every repository you own with a
/// public-domain-equivalent one.
#[derive(Parser, Debug, Clone)]
#[command(name = "copyright-waiver")]
#[command(version)]
pub struct Cli {
    /// Forge username whose repositories are relicensed
    #[arg(long)]
    pub name: String,

    /// Path to the SSH private key used for clone and push (`~` is expanded)
    #[arg(long = "ssh-key")]
    pub ssh_key: String,

    /// Passphrase of the SSH key
    #[arg(long, env = "COPYRIGHT_WAIVER_SSH_PASSPHRASE", hide_env_values = true)]
    pub ssh_passphrase: Option<String>,

    /// Directory holding the clones during the run
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Commit author and committer name
    #[arg(long, env = "COPYRIGHT_WAIVER_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Commit author and committer email
    #[arg(long, env = "COPYRIGHT_WAIVER_AUTHOR_EMAIL")]
    pub author_email: Option<String>,

    /// API token, raises the forge rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Forge API root
    #[arg(long)]
    pub api_base: Option<String>,

    /// Key of the replacement license
    #[arg(long)]
    pub license: Option<String>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List eligible repositories without touching them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings file contents; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl Settings {
    /// Load settings from an explicit file, which must exist
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WaiverError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            WaiverError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the per-user settings file if there is one
    pub fn load_default() -> Result<Self> {
        match dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE)) {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Fully resolved configuration of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub username: String,
    pub ssh_key: String,
    pub ssh_passphrase: Option<String>,
    pub workspace: Workspace,
    pub identity: CommitIdentity,
    pub api_base: String,
    pub github_token: Option<String>,
    pub license: String,
    pub dry_run: bool,
}

impl Cli {
    /// Merge with the settings file named by `--config`, or the per-user one
    pub fn into_config(self) -> Result<RunConfig> {
        let settings = match self.config {
            Some(ref path) => Settings::load(path)?,
            None => Settings::load_default()?,
        };
        self.resolve(settings)
    }

    /// Merge with `settings`; command-line values win
    pub fn resolve(self, settings: Settings) -> Result<RunConfig> {
        if self.name.trim().is_empty() {
            return Err(WaiverError::Config("--name must not be empty".to_string()));
        }
        if self.ssh_key.trim().is_empty() {
            return Err(WaiverError::Config("--ssh-key must not be empty".to_string()));
        }

        let author_name = self.author_name.or(settings.author_name);
        let author_email = self.author_email.or(settings.author_email);
        let identity = match (author_name, author_email) {
            (Some(name), Some(email)) if !name.trim().is_empty() && !email.trim().is_empty() => {
                CommitIdentity::new(name, email)
            }
            _ => {
                return Err(WaiverError::Config(
                    "Commit identity required: set --author-name and --author-email".to_string(),
                ))
            }
        };

        let api_base = self
            .api_base
            .or(settings.api_base)
            .unwrap_or_else(|| GITHUB_API_BASE.to_string());
        url::Url::parse(&api_base)
            .map_err(|e| WaiverError::Config(format!("Invalid API base {}: {}", api_base, e)))?;

        let workspace = self
            .workspace
            .or(settings.workspace)
            .map(Workspace::new)
            .unwrap_or_default();

        Ok(RunConfig {
            username: self.name,
            ssh_key: self.ssh_key,
            ssh_passphrase: self.ssh_passphrase,
            workspace,
            identity,
            api_base,
            github_token: self.github_token,
            license: self
                .license
                .or(settings.license)
                .unwrap_or_else(|| DEFAULT_LICENSE_KEY.to_string()),
            dry_run: self.dry_run,
        })
    }
}
