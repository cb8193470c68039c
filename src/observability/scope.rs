//! ObservationScope for BEGIN/END step logging
//!
//! - Logs `BEGIN: <step>` on creation
//! - Logs `END: <step>, took <n> ms` on `complete()`
//! - Logs `FAILED: <step>` on `fail()`
//! - Logs `INCOMPLETE: <step>` on drop otherwise

use std::cell::Cell;
use std::time::Instant;

/// A scope that logs the start and end of a long step.
///
/// ```ignore
/// let scope = ObservationScope::new("Removing build aggregation group");
/// // ... do work ...
/// scope.complete();
/// ```
pub struct ObservationScope {
    step: String,
    started: Instant,
    completed: Cell<bool>,
}

impl ObservationScope {
    /// Logs `BEGIN: <step>` immediately.
    pub fn new(step: impl Into<String>) -> Self {
        let step = step.into();
        tracing::info!("BEGIN: {}", step);

        Self {
            step,
            started: Instant::now(),
            completed: Cell::new(false),
        }
    }

    /// Logs `END: <step>, took <n> ms` at INFO level.
    pub fn complete(self) {
        self.completed.set(true);
        tracing::info!("END: {}, took {} ms", self.step, self.elapsed_ms());
    }

    /// Logs `FAILED: <step>` at ERROR level.
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        tracing::error!(
            reason,
            "FAILED: {}, took {} ms",
            self.step,
            self.elapsed_ms()
        );
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed.get() {
            tracing::warn!(
                "INCOMPLETE: {}, dropped after {} ms",
                self.step,
                self.elapsed_ms()
            );
        }
    }
}
