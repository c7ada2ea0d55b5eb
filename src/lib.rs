//! copyright-waiver
//!
//! Relicenses every non-fork, non-archived repository of a forge user under a
//! public-domain-equivalent license: clone, replace `LICENSE`, commit, push,
//! clean up.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::RunConfig;
use error::Result;
use services::{
    CancellationToken, GitHubClient, GitService, RunCoordinator, RunReport, SshCredentials,
};

/// Initialize logging; `RUST_LOG` overrides the default directives
pub fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "copyright_waiver=debug,git2=warn"
    } else {
        "copyright_waiver=info,git2=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Execute one run with the given configuration
pub async fn run(config: RunConfig, cancel: CancellationToken) -> Result<RunReport> {
    let credentials = SshCredentials::from_path(&config.ssh_key, config.ssh_passphrase.clone())?;

    let forge = Arc::new(GitHubClient::new(
        config.api_base.clone(),
        config.github_token.clone(),
    ));
    let git = Arc::new(GitService::new(credentials, config.identity.clone()));

    tracing::info!(
        "Starting run for {} in {}",
        config.username,
        config.workspace.root().display()
    );

    let mut coordinator = RunCoordinator::new(
        forge,
        git,
        config.workspace.clone(),
        config.license.clone(),
        cancel,
    );
    coordinator.run(&config.username, config.dry_run).await
}
