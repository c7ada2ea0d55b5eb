//! Git stages of the relicensing workflow: clone, commit and push

use std::path::Path;

use git2::build::RepoBuilder;

use crate::error::{Result, WaiverError};
use crate::models::{CommitIdentity, LocalRepository, RepositoryRecord, COMMIT_MESSAGE};
use crate::services::cancellation::CancellationToken;
use crate::services::credentials_service::SshCredentials;
use crate::services::license_service::CANONICAL_LICENSE_FILE;

const REMOTE_NAME: &str = "origin";

/// Git operations the run coordinator drives for each repository
pub trait GitBackend: Send + Sync {
    /// Single-branch clone of `record` into `dest`, aborted when `cancel` fires
    fn clone_repository(
        &self,
        record: &RepositoryRecord,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<LocalRepository>;

    /// Stage the canonical license file and commit it
    fn commit_license(&self, local: &LocalRepository) -> Result<git2::Oid>;

    /// Push the advanced HEAD ref to `origin`
    fn push(&self, local: &LocalRepository) -> Result<()>;
}

/// libgit2-backed implementation of [`GitBackend`]
pub struct GitService {
    credentials: SshCredentials,
    identity: CommitIdentity,
}

impl GitService {
    pub fn new(credentials: SshCredentials, identity: CommitIdentity) -> Self {
        Self {
            credentials,
            identity,
        }
    }
}

impl GitBackend for GitService {
    fn clone_repository(
        &self,
        record: &RepositoryRecord,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<LocalRepository> {
        clone_repository(record, dest, &self.credentials, cancel)
    }

    fn commit_license(&self, local: &LocalRepository) -> Result<git2::Oid> {
        commit_license(local, &self.identity)
    }

    fn push(&self, local: &LocalRepository) -> Result<()> {
        push(local, &self.credentials)
    }
}

/// Clone only the default branch of `record` into `dest`
pub fn clone_repository(
    record: &RepositoryRecord,
    dest: &Path,
    credentials: &SshCredentials,
    cancel: &CancellationToken,
) -> Result<LocalRepository> {
    if cancel.is_cancelled() {
        return Err(WaiverError::Cancelled);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(
        "Cloning {} ({}) from {}",
        record.name,
        record.default_branch,
        record.ssh_url
    );

    let branch = record.default_branch.clone();
    let mut builder = RepoBuilder::new();
    builder
        .branch(&record.default_branch)
        .fetch_options(credentials.fetch_options(cancel.clone()))
        .remote_create(move |repo, name, url| {
            let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, name);
            repo.remote_with_fetch(name, url, &refspec)
        });

    builder
        .clone(&record.ssh_url, dest)
        .map_err(|e| clone_error(record, e, cancel))?;

    Ok(LocalRepository {
        name: record.name.clone(),
        path: dest.to_path_buf(),
        branch: record.default_branch.clone(),
    })
}

fn clone_error(
    record: &RepositoryRecord,
    err: git2::Error,
    cancel: &CancellationToken,
) -> WaiverError {
    if cancel.is_cancelled() {
        return WaiverError::Cancelled;
    }

    match err.code() {
        git2::ErrorCode::Auth | git2::ErrorCode::Certificate => {
            WaiverError::Auth(format!("{}: {}", record.name, err.message()))
        }
        _ => WaiverError::Clone {
            repo: record.name.clone(),
            message: err.message().to_string(),
        },
    }
}

/// Stage exactly the canonical license file and commit it on HEAD
pub fn commit_license(local: &LocalRepository, identity: &CommitIdentity) -> Result<git2::Oid> {
    let repo = git2::Repository::open(&local.path)?;

    let mut index = repo.index()?;
    index.add_path(Path::new(CANONICAL_LICENSE_FILE))?;
    index.write()?;
    let tree_oid = index.write_tree()?;
    let tree = repo.find_tree(tree_oid)?;

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    if parent.as_ref().is_some_and(|p| p.tree_id() == tree_oid) {
        return Err(WaiverError::NothingToCommit(local.name.clone()));
    }
    let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

    let signature = identity.signature()?;
    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        COMMIT_MESSAGE,
        &tree,
        &parents,
    )?;

    tracing::info!("Committed {} in {}", oid, local.name);
    Ok(oid)
}

/// Push the ref HEAD points at to the same ref on `origin`
pub fn push(local: &LocalRepository, credentials: &SshCredentials) -> Result<()> {
    let repo = git2::Repository::open(&local.path)?;

    let mut remote = repo.find_remote(REMOTE_NAME).map_err(|_| WaiverError::Push {
        repo: local.name.clone(),
        message: format!("remote {} not found", REMOTE_NAME),
    })?;

    let head = repo.head()?;
    let refname = head.name().ok_or_else(|| WaiverError::Push {
        repo: local.name.clone(),
        message: "HEAD is not a valid UTF-8 reference".to_string(),
    })?;
    let refspec = format!("{0}:{0}", refname);

    tracing::info!("Pushing {} to {}", refname, REMOTE_NAME);

    remote
        .push(&[&refspec], Some(&mut credentials.push_options()))
        .map_err(|e| match e.code() {
            git2::ErrorCode::Auth | git2::ErrorCode::Certificate => {
                WaiverError::Auth(format!("{}: {}", local.name, e.message()))
            }
            _ => WaiverError::Push {
                repo: local.name.clone(),
                message: e.message().to_string(),
            },
        })
}
