//! Cooldown control for a shared rate-limit budget.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::Notify;

const LOG_TARGET: &str = "  governor";

/// Suspends request issuance for a fixed cooldown window after a rate-limit
/// signal, then resumes automatically.
///
/// Wrap in an `Arc` via [`Governor::new`]. Callers await [`Governor::ready`]
/// before issuing a request; any caller that observes a rate-limit response
/// calls [`Governor::begin_cooldown`]. While a cooldown is active, waiting
/// callers stay parked rather than retrying.
#[derive(Debug)]
pub struct Governor {
    cooldown: Duration,
    paused: AtomicBool,
    resume: Notify,
    cooldowns_started: AtomicU64,
}

impl Governor {
    /// Create a new governor with the given cooldown window.
    pub fn new(cooldown: Duration) -> Arc<Self> {
        Arc::new(Self {
            cooldown,
            paused: AtomicBool::new(false),
            resume: Notify::new(),
            cooldowns_started: AtomicU64::new(0),
        })
    }

    /// Wait until request issuance is allowed.
    pub async fn ready(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume.notified().await;
        }
    }

    /// Returns whether a cooldown is currently in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// The configured cooldown window.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Number of cooldowns established so far.
    #[must_use]
    pub fn cooldowns_started(&self) -> u64 {
        self.cooldowns_started.load(Ordering::Relaxed)
    }

    /// Suspend request issuance for the cooldown window, then automatically resume.
    ///
    /// If a cooldown is already active this is a no-op and returns `false`.
    /// Returns `true` only when a new cooldown is actually established.
    pub fn begin_cooldown(self: &Arc<Self>) -> bool {
        if self.paused.swap(true, Ordering::AcqRel) {
            return false; // a cooldown is already running
        }

        let _ = self.cooldowns_started.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            target: LOG_TARGET,
            "rate limited; suspending requests for {}s",
            self.cooldown.as_secs()
        );

        let this = Arc::clone(self);
        drop(tokio::spawn(async move {
            tokio::time::sleep(this.cooldown).await;
            this.paused.store(false, Ordering::Release);
            this.resume.notify_waiters();
            log::info!(target: LOG_TARGET, "cooldown elapsed, resuming requests");
        }));

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_returns_immediately_when_not_paused() {
        let governor = Governor::new(Duration::from_secs(900));
        governor.ready().await;
        assert!(!governor.is_paused());
    }

    #[tokio::test]
    async fn cooldown_blocks_ready_until_it_elapses() {
        let governor = Governor::new(Duration::from_millis(100));
        assert!(governor.begin_cooldown());
        assert!(governor.is_paused());

        let start = tokio::time::Instant::now();
        governor.ready().await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(80));
        assert!(!governor.is_paused());
    }

    #[tokio::test]
    async fn overlapping_cooldowns_collapse_into_one() {
        let governor = Governor::new(Duration::from_millis(100));
        assert!(governor.begin_cooldown());
        assert!(!governor.begin_cooldown());
        assert_eq!(governor.cooldowns_started(), 1);

        governor.ready().await;

        // After resuming, a fresh cooldown can start again.
        assert!(governor.begin_cooldown());
        assert_eq!(governor.cooldowns_started(), 2);
    }
}
