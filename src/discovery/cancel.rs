//! Cooperative cancellation for a search
//!
//! The caller holds a token and may set it at any time. The orchestrator
//! checks it before each phase and before each per-candidate lookup; work
//! already finished stays in the result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Ask the search to stop at its next check.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Cancel once `deadline` has passed. Aborting the returned handle
    /// disarms the deadline.
    pub fn cancel_after(&self, deadline: Duration) -> JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            tracing::info!(?deadline, "search deadline reached");
            token.cancel();
        })
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::default();
        let held_by_search = token.clone();
        token.cancel();
        assert!(held_by_search.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_later() {
        let token = CancellationToken::new();
        let timer = token.cancel_after(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(!token.is_cancelled());
        timer.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_deadline_never_fires() {
        let token = CancellationToken::new();
        token.cancel_after(Duration::from_secs(1)).abort();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!token.is_cancelled());
    }
}
