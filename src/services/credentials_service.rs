//! SSH credentials service
//!
//! Loads the operator's SSH key once per run and hands out git2 remote
//! callbacks that authenticate with it and report transfer progress.

use git2::{Cred, CredentialType, RemoteCallbacks};
use std::path::{Path, PathBuf};

use crate::error::{Result, WaiverError};
use crate::services::cancellation::CancellationToken;

/// Expand a leading `~` to the user's home directory
pub fn normalize_ssh_key_path(path: &str) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir()
        .ok_or_else(|| WaiverError::Auth("Cannot determine home directory".to_string()))?;

    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// SSH public-key credentials shared by every clone and push of a run
#[derive(Debug, Clone)]
pub struct SshCredentials {
    private_key: PathBuf,
    public_key: Option<PathBuf>,
    passphrase: Option<String>,
}

impl SshCredentials {
    /// Load credentials from a private key path, which must exist
    pub fn from_path(path: &str, passphrase: Option<String>) -> Result<Self> {
        let private_key = normalize_ssh_key_path(path)?;

        if !private_key.is_file() {
            return Err(WaiverError::Auth(format!(
                "SSH key not found: {}",
                private_key.display()
            )));
        }

        let mut public_key = private_key.clone().into_os_string();
        public_key.push(".pub");
        let public_key = Some(PathBuf::from(public_key)).filter(|p| p.is_file());

        tracing::debug!(
            "Using SSH key {:?} (public key: {:?})",
            private_key,
            public_key
        );

        Ok(Self {
            private_key,
            public_key,
            passphrase,
        })
    }

    pub fn private_key(&self) -> &Path {
        &self.private_key
    }

    /// Remote callbacks that authenticate with this key. The key is offered
    /// once; a second request from libgit2 means it was rejected.
    pub fn get_callbacks(&self) -> RemoteCallbacks<'static> {
        let private_key = self.private_key.clone();
        let public_key = self.public_key.clone();
        let passphrase = self.passphrase.clone();
        let mut tried_ssh_key = false;

        let mut callbacks = RemoteCallbacks::new();

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            tracing::debug!(
                "Credential callback: url={}, username={:?}, allowed={:?}",
                url,
                username_from_url,
                allowed_types
            );

            if allowed_types.contains(CredentialType::SSH_KEY) && !tried_ssh_key {
                tried_ssh_key = true;
                let username = username_from_url.unwrap_or("git");
                return Cred::ssh_key(
                    username,
                    public_key.as_deref(),
                    &private_key,
                    passphrase.as_deref(),
                );
            }

            Err(git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Ssh,
                format!("SSH key {} was rejected for {}", private_key.display(), url),
            ))
        });

        callbacks
    }

    /// Fetch options for cloning: credentials, progress, and abort on cancel
    pub fn fetch_options(&self, cancel: CancellationToken) -> git2::FetchOptions<'static> {
        let mut callbacks = self.get_callbacks();

        callbacks.transfer_progress(move |stats| {
            if cancel.is_cancelled() {
                tracing::debug!("Transfer cancelled");
                return false;
            }

            let received = stats.received_objects();
            let total = stats.total_objects();
            if total > 0 {
                let percent = (received as f64 / total as f64) * 100.0;
                tracing::debug!(
                    "Transfer progress: {}/{} objects ({:.1}%), {} bytes",
                    received,
                    total,
                    percent,
                    stats.received_bytes()
                );
            }

            true
        });

        callbacks.sideband_progress(log_sideband);

        let mut fetch_opts = git2::FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);
        fetch_opts
    }

    /// Push options: credentials, progress, and per-ref rejection reporting
    pub fn push_options(&self) -> git2::PushOptions<'static> {
        let mut callbacks = self.get_callbacks();

        callbacks.push_transfer_progress(|current, total, bytes| {
            if total > 0 {
                let percent = (current as f64 / total as f64) * 100.0;
                tracing::debug!(
                    "Push progress: {}/{} objects ({:.1}%), {} bytes",
                    current,
                    total,
                    percent,
                    bytes
                );
            }
        });

        callbacks.sideband_progress(log_sideband);

        // libgit2 reports a successful push even when the server refuses a
        // ref; the refusal only shows up here.
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "{} rejected: {}",
                refname, reason
            ))),
            None => Ok(()),
        });

        let mut push_opts = git2::PushOptions::new();
        push_opts.remote_callbacks(callbacks);
        push_opts
    }
}

/// Forward server messages to the log
fn log_sideband(data: &[u8]) -> bool {
    if let Ok(msg) = std::str::from_utf8(data) {
        let msg = msg.trim();
        if !msg.is_empty() {
            tracing::info!("Remote: {}", msg);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_path_is_unchanged() {
        assert_eq!(
            normalize_ssh_key_path("/keys/id_ed25519").unwrap(),
            PathBuf::from("/keys/id_ed25519")
        );
    }

    #[test]
    fn test_leading_tilde_expands_to_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            normalize_ssh_key_path("~/.ssh/id_rsa").unwrap(),
            home.join(".ssh/id_rsa")
        );
        assert_eq!(normalize_ssh_key_path("~").unwrap(), home);
    }

    #[test]
    fn test_other_user_tilde_is_not_expanded() {
        assert_eq!(
            normalize_ssh_key_path("~bob/.ssh/id_rsa").unwrap(),
            PathBuf::from("~bob/.ssh/id_rsa")
        );
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("id_missing");
        let err = SshCredentials::from_path(missing.to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, WaiverError::Auth(_)));
    }

    #[test]
    fn test_existing_key_picks_up_public_half() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("id_ed25519");
        std::fs::write(&key, "private").unwrap();
        std::fs::write(dir.path().join("id_ed25519.pub"), "public").unwrap();

        let creds = SshCredentials::from_path(key.to_str().unwrap(), None).unwrap();
        assert_eq!(creds.private_key(), key.as_path());
        assert_eq!(creds.public_key, Some(dir.path().join("id_ed25519.pub")));
    }
}
