//! Observability for the repository driver
//!
//! - Structured logging through `tracing`, JSON or human-readable
//! - BEGIN/END scopes around long steps
//! - A separate user-log target for build-facing messages
//! - Operational counters
//!
//! ```ignore
//! use repository_driver::observability::{ObservationScope, USER_LOG};
//!
//! tracing::info!(target: USER_LOG, "Processing dependencies");
//!
//! let scope = ObservationScope::new("Process artifacts downloaded by build");
//! // ... do work ...
//! scope.complete();
//! ```

mod metrics;
mod scope;

pub use metrics::{DriverMetrics, MetricsSnapshot};
pub use scope::ObservationScope;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Target of messages meant for the build's own log
pub const USER_LOG: &str = "repository_driver::userlog";

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Installing twice is a no-op.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "Logging already initialised");
    }
}
