//! Driver counters
//!
//! - Counters only, monotonic, reset on process start
//! - Relaxed atomics; exact ordering between counters does not matter

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of the driver.
#[derive(Debug, Default)]
pub struct DriverMetrics {
    builds_created: AtomicU64,
    promotions_started: AtomicU64,
    promotions_succeeded: AtomicU64,
    promotions_failed: AtomicU64,
    promotions_rejected: AtomicU64,
    rollbacks: AtomicU64,
    callbacks_delivered: AtomicU64,
    callbacks_undelivered: AtomicU64,
    heartbeats_failed: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub builds_created: u64,
    pub promotions_started: u64,
    pub promotions_succeeded: u64,
    pub promotions_failed: u64,
    /// Promotions refused while shutting down
    pub promotions_rejected: u64,
    pub rollbacks: u64,
    pub callbacks_delivered: u64,
    pub callbacks_undelivered: u64,
    pub heartbeats_failed: u64,
}

impl DriverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_builds_created(&self) {
        self.builds_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_promotions_started(&self) {
        self.promotions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_promotions_succeeded(&self) {
        self.promotions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_promotions_failed(&self) {
        self.promotions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_promotions_rejected(&self) {
        self.promotions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rollbacks(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_callbacks_delivered(&self) {
        self.callbacks_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_callbacks_undelivered(&self) {
        self.callbacks_undelivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_heartbeats_failed(&self) {
        self.heartbeats_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            builds_created: self.builds_created.load(Ordering::Relaxed),
            promotions_started: self.promotions_started.load(Ordering::Relaxed),
            promotions_succeeded: self.promotions_succeeded.load(Ordering::Relaxed),
            promotions_failed: self.promotions_failed.load(Ordering::Relaxed),
            promotions_rejected: self.promotions_rejected.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            callbacks_delivered: self.callbacks_delivered.load(Ordering::Relaxed),
            callbacks_undelivered: self.callbacks_undelivered.load(Ordering::Relaxed),
            heartbeats_failed: self.heartbeats_failed.load(Ordering::Relaxed),
        }
    }
}
