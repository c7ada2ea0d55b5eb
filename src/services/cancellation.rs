//! Run-scoped cancellation and interrupt handling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// A token that can be used to check if the run has been cancelled
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the run
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Exit status used when a second interrupt forces the process down
pub const FORCED_EXIT_CODE: i32 = 130;

/// What the watcher does with an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First interrupt: let the current repository finish
    Cancel,
    /// Interrupt while already cancelled: stop immediately
    Exit,
}

/// Record one interrupt against `token`
pub fn on_interrupt(token: &CancellationToken) -> InterruptAction {
    if token.is_cancelled() {
        InterruptAction::Exit
    } else {
        token.cancel();
        InterruptAction::Cancel
    }
}

/// Spawn the single background task that turns Ctrl-C into a cancellation
/// of `token`. Registered once per run; every repository observes the same
/// token. A second Ctrl-C exits the process, since a push stuck on the
/// network never checks the token.
pub fn spawn_interrupt_watcher(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for interrupt: {}", e);
                return;
            }
            match on_interrupt(&token) {
                InterruptAction::Cancel => tracing::warn!(
                    "Interrupt received, stopping after the current repository \
                     (press Ctrl-C again to exit now)"
                ),
                InterruptAction::Exit => {
                    tracing::warn!("Second interrupt received, exiting");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_clone_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancellation_visible_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_first_interrupt_cancels_second_exits() {
        let token = CancellationToken::new();
        assert_eq!(on_interrupt(&token), InterruptAction::Cancel);
        assert!(token.is_cancelled());
        assert_eq!(on_interrupt(&token), InterruptAction::Exit);
        assert_eq!(on_interrupt(&token), InterruptAction::Exit);
    }

    #[tokio::test]
    async fn test_watcher_can_be_aborted_without_cancelling() {
        let token = CancellationToken::new();
        let handle = spawn_interrupt_watcher(token.clone());
        handle.abort();
        let _ = handle.await;
        assert!(!token.is_cancelled());
    }
}
