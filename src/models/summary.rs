//! Run outcome models

use std::fmt;

/// Result of processing a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// License replaced, committed and pushed
    Updated { commit: String },
    /// Not touched, with the reason
    Skipped { reason: String },
    /// A stage failed; `code` is the error's stable code
    Failed { code: &'static str, message: String },
}

/// Aggregated outcome of a whole run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub entries: Vec<(String, RepoOutcome)>,
    pub interrupted: bool,
}

/// Overall process status derived from a [`RunSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
    Interrupted,
}

impl RunSummary {
    pub fn record(&mut self, name: impl Into<String>, outcome: RepoOutcome) {
        self.entries.push((name.into(), outcome));
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Failed { .. }))
    }

    pub fn outcome_of(&self, name: &str) -> Option<&RepoOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn status(&self) -> RunStatus {
        if self.interrupted {
            RunStatus::Interrupted
        } else if self.failed() == 0 {
            RunStatus::Success
        } else if self.updated() == 0 {
            RunStatus::Failure
        } else {
            RunStatus::PartialFailure
        }
    }

    fn count(&self, pred: impl Fn(&RepoOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| pred(o)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} updated, {} skipped, {} failed",
            self.updated(),
            self.skipped(),
            self.failed()
        )?;
        for (name, outcome) in &self.entries {
            match outcome {
                RepoOutcome::Updated { commit } => writeln!(f, "  updated  {} ({})", name, commit)?,
                RepoOutcome::Skipped { reason } => writeln!(f, "  skipped  {}: {}", name, reason)?,
                RepoOutcome::Failed { code, message } => {
                    writeln!(f, "  failed   {}: [{}] {}", name, code, message)?
                }
            }
        }
        Ok(())
    }
}
