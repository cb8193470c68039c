//! # Notification Errors
//!
//! Never surfaced to callers of the driver: callbacks and heartbeats log
//! their failures and move on.

use thiserror::Error;

/// Result type for outbound notifications
pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("{method} {uri} failed: {reason}")]
    Transport {
        method: String,
        uri: String,
        reason: String,
    },
}
