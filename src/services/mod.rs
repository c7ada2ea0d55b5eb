//! Service layer for copyright-waiver
//!
//! Each stage of the relicensing workflow lives in its own module; the
//! coordinator sequences them over the eligible repositories.

pub mod cancellation;
pub mod coordinator;
pub mod credentials_service;
pub mod filter;
pub mod forge;
pub mod git_service;
pub mod license_service;
pub mod workspace;

pub use cancellation::{spawn_interrupt_watcher, CancellationToken};
pub use coordinator::{RunCoordinator, RunReport, RunState};
pub use credentials_service::SshCredentials;
pub use forge::{ForgeClient, GitHubClient};
pub use git_service::{GitBackend, GitService};
pub use workspace::Workspace;
