//! # Repository Manager Errors

use thiserror::Error;

/// Result type for repository manager calls
pub type RepoResult<T> = Result<T, RepoError>;

/// Failure talking to the repository manager.
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Repository manager returned HTTP {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Repository manager unavailable: {0}")]
    Unavailable(String),
}
