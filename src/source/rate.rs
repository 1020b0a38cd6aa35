//! Pacing between calls to an external source
//!
//! Every external call goes through a [`RateGate`] attached to the source
//! handle. The gate is injected, so tests run with [`NoDelay`] or with a
//! paused tokio clock.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Waits until the next call to a source is allowed.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Suspend until a call may proceed, then reserve the slot.
    async fn wait(&self);
}

/// Enforces a minimum interval between consecutive calls.
///
/// The first call passes immediately.
#[derive(Debug)]
pub struct FixedIntervalGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateGate for FixedIntervalGate {
    async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// A gate that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[async_trait]
impl RateGate for NoDelay {
    async fn wait(&self) {}
}

/// Build a shared gate: zero intervals get [`NoDelay`].
pub fn gate_for(ms: u64) -> Arc<dyn RateGate> {
    if ms == 0 {
        Arc::new(NoDelay)
    } else {
        Arc::new(FixedIntervalGate::from_millis(ms))
    }
}
