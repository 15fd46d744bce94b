//! Pauses between paced submissions

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Elapsed,
    Cancelled,
}

/// Waits between submissions and reports whether the run was cancelled meanwhile
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, interval: Duration) -> PauseOutcome;

    /// Checked before every submission
    fn is_cancelled(&self) -> bool;
}

/// Real-time pacer that wakes early on cancellation
#[derive(Debug, Clone, Default)]
pub struct CancellablePacer {
    token: CancellationToken,
}

impl CancellablePacer {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[async_trait]
impl Pacer for CancellablePacer {
    async fn pause(&self, interval: Duration) -> PauseOutcome {
        debug!(interval_secs = interval.as_secs_f64(), "Pacing before next order");
        tokio::select! {
            _ = self.token.cancelled() => PauseOutcome::Cancelled,
            _ = tokio::time::sleep(interval) => PauseOutcome::Elapsed,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Returns immediately and remembers each requested pause.
///
/// Optionally cancels the run once a given number of pauses has been taken.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
    cancel_after: Option<usize>,
    token: CancellationToken,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_after(pauses: usize) -> Self {
        Self {
            cancel_after: Some(pauses),
            ..Self::default()
        }
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .map(|pauses| pauses.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, interval: Duration) -> PauseOutcome {
        let taken = match self.pauses.lock() {
            Ok(mut pauses) => {
                pauses.push(interval);
                pauses.len()
            }
            Err(_) => 0,
        };
        if self.cancel_after.is_some_and(|limit| taken >= limit) {
            self.token.cancel();
        }
        if self.token.is_cancelled() {
            PauseOutcome::Cancelled
        } else {
            PauseOutcome::Elapsed
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
