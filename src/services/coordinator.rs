//! Run coordinator
//!
//! Drives one run through `Idle -> Listing -> Resolving -> Processing(i) ->
//! Teardown -> Done`. Listing and license resolution failures are fatal.
//! Per-repository failures are recorded in the [`RunSummary`] and the loop
//! moves on, except for failures that would repeat for every remaining
//! repository (rejected credentials, operator interrupt).
//!
//! Only the clone observes cancellation. Once a clone has completed, the
//! license write, commit and push for that repository run to completion.

use std::sync::Arc;

use tracing::Instrument;

use crate::error::{Result, WaiverError};
use crate::models::{LicenseText, RepoOutcome, RepositoryRecord, RunSummary};
use crate::services::cancellation::CancellationToken;
use crate::services::filter;
use crate::services::forge::ForgeClient;
use crate::services::git_service::GitBackend;
use crate::services::license_service;
use crate::services::workspace::Workspace;

/// Where the coordinator is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Listing,
    Resolving,
    Processing(usize),
    Teardown,
    Done,
    Fatal,
}

/// What a finished run produced
#[derive(Debug)]
pub enum RunReport {
    /// No repository survived the filter
    NothingToDo,
    /// Eligible repositories of a dry run
    DryRun(Vec<RepositoryRecord>),
    Completed(RunSummary),
}

pub struct RunCoordinator {
    forge: Arc<dyn ForgeClient>,
    git: Arc<dyn GitBackend>,
    workspace: Workspace,
    license_key: String,
    cancel: CancellationToken,
    state: RunState,
}

impl RunCoordinator {
    pub fn new(
        forge: Arc<dyn ForgeClient>,
        git: Arc<dyn GitBackend>,
        workspace: Workspace,
        license_key: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            forge,
            git,
            workspace,
            license_key: license_key.into(),
            cancel,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Relicense every eligible repository of `owner`
    pub async fn run(&mut self, owner: &str, dry_run: bool) -> Result<RunReport> {
        let result = self.run_inner(owner, dry_run).await;
        if result.is_err() {
            self.transition(RunState::Fatal);
        }
        result
    }

    async fn run_inner(&mut self, owner: &str, dry_run: bool) -> Result<RunReport> {
        self.transition(RunState::Listing);
        let eligible = filter::filter(self.forge.list_repositories(owner).await?);

        if eligible.is_empty() {
            self.transition(RunState::Done);
            return Ok(RunReport::NothingToDo);
        }
        tracing::info!("{} repositories eligible for relicensing", eligible.len());

        if dry_run {
            self.transition(RunState::Done);
            return Ok(RunReport::DryRun(eligible));
        }

        self.transition(RunState::Resolving);
        let license = self.forge.license_text(&self.license_key).await?;

        self.workspace.prepare()?;

        let mut summary = RunSummary::default();
        let mut abort_reason: Option<String> = None;

        for (index, record) in eligible.iter().enumerate() {
            self.transition(RunState::Processing(index));

            if self.cancel.is_cancelled() {
                summary.record(&record.name, skipped("run interrupted"));
                continue;
            }
            if let Some(ref reason) = abort_reason {
                summary.record(&record.name, skipped(reason));
                continue;
            }

            let span = tracing::info_span!("repository", name = %record.name);
            let outcome = match self.process(record, &license).instrument(span).await {
                Ok(oid) => {
                    tracing::info!("Updated {}", record.name);
                    RepoOutcome::Updated {
                        commit: oid.to_string(),
                    }
                }
                Err(WaiverError::NothingToCommit(_)) => {
                    tracing::info!("{} already carries the license", record.name);
                    skipped("license already up to date")
                }
                Err(e) => {
                    tracing::error!(code = e.code(), "Failed to update {}: {}", record.name, e);
                    if e.aborts_run() && !matches!(e, WaiverError::Cancelled) {
                        abort_reason = Some(format!("run aborted: {}", e));
                    }
                    RepoOutcome::Failed {
                        code: e.code(),
                        message: e.to_string(),
                    }
                }
            };
            summary.record(&record.name, outcome);
        }

        self.transition(RunState::Teardown);
        if let Err(e) = self.workspace.teardown() {
            tracing::warn!("{}", e);
        }

        summary.interrupted = self.cancel.is_cancelled();
        self.transition(RunState::Done);
        Ok(RunReport::Completed(summary))
    }

    /// Clone, relicense, commit and push one repository
    async fn process(&self, record: &RepositoryRecord, license: &LicenseText) -> Result<git2::Oid> {
        let dest = self.workspace.path_for(&record.name);

        let git = Arc::clone(&self.git);
        let cancel = self.cancel.clone();
        let owned = record.clone();
        let local =
            tokio::task::spawn_blocking(move || git.clone_repository(&owned, &dest, &cancel))
                .await
                .map_err(|e| WaiverError::OperationFailed(format!("Clone task failed: {}", e)))??;

        let git = Arc::clone(&self.git);
        let license = license.clone();
        tokio::task::spawn_blocking(move || -> Result<git2::Oid> {
            license_service::apply_license(&local, &license)?;
            let oid = git.commit_license(&local)?;
            git.push(&local)?;
            Ok(oid)
        })
        .await
        .map_err(|e| WaiverError::OperationFailed(format!("Update task failed: {}", e)))?
    }
}

fn skipped(reason: &str) -> RepoOutcome {
    RepoOutcome::Skipped {
        reason: reason.to_string(),
    }
}
