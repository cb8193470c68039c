//! Driver lifecycle
//!
//! Tracks running promotion jobs and the shutdown flag. Once shutdown has
//! begun no new promotion is accepted; running ones are waited for up to
//! a timeout.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Lifecycle {
    shutting_down: AtomicBool,
    active: AtomicUsize,
    idle: Notify,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            tracing::info!(
                active_promotions = self.active_promotions(),
                "Shutdown requested, refusing new promotions"
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn active_promotions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Counts one running promotion until the guard is dropped.
    pub fn track(self: &Arc<Self>) -> ActivePromotionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ActivePromotionGuard {
            lifecycle: Arc::clone(self),
        }
    }

    /// Waits until no promotion is running. Returns `false` on timeout.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let idle = self.idle.notified();
                if self.active_promotions() == 0 {
                    return;
                }
                idle.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Decrements the running-promotion counter on drop, whichever way the
/// job ends.
#[derive(Debug)]
pub struct ActivePromotionGuard {
    lifecycle: Arc<Lifecycle>,
}

impl Drop for ActivePromotionGuard {
    fn drop(&mut self) {
        if self.lifecycle.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.lifecycle.idle.notify_waiters();
        }
    }
}
