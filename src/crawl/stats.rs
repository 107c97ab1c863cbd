//! Run-lifetime request counters.

use core::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;
use std::sync::Mutex;

/// Counters shared between the gateway and the progress display.
///
/// Monotonically increasing within a run; reset only at process start.
/// `without_cooldown` counts the attempts that did not end in a rate-limit
/// signal, so the gap to `issued` is the number of cooldowns paid for.
#[derive(Debug, Default)]
pub struct RunStats {
    issued: AtomicU64,
    without_cooldown: AtomicU64,
    resolved: AtomicU64,
    current_user: Mutex<String>,
}

/// Point-in-time copy of the counters, as written into the run report.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub requests_issued: u64,
    pub requests_without_cooldown: u64,
    pub requests_resolved: u64,
}

impl RunStats {
    /// Mark that a request attempt has been issued.
    pub fn record_issued(&self) {
        let _ = self.issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark that an attempt completed without hitting the rate limit.
    pub fn record_without_cooldown(&self) {
        let _ = self.without_cooldown.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark that a call resolved, either with a payload or a classified sentinel.
    pub fn record_resolved(&self) {
        let _ = self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn without_cooldown(&self) -> u64 {
        self.without_cooldown.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn resolved(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    /// Record which user the crawl is currently working on.
    pub fn set_current_user(&self, name: &str) {
        name.clone_into(&mut *self.current_user.lock().expect("lock poisoned"));
    }

    #[must_use]
    pub fn current_user(&self) -> String {
        self.current_user.lock().expect("lock poisoned").clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_issued: self.issued(),
            requests_without_cooldown: self.without_cooldown(),
            requests_resolved: self.resolved(),
        }
    }
}
