//! # Promotion Errors
//!
//! A rejected promotion (`Validation`) is a policy outcome reported as a
//! failed build; every other variant is an infrastructure fault.

use thiserror::Error;

use crate::repo::RepoError;

/// Result type for promotions
pub type PromotionResult<T> = Result<T, PromotionError>;

#[derive(Debug, Clone, Error)]
pub enum PromotionError {
    /// The promote call itself failed
    #[error("Failed to promote: {request}. Reason: {error}")]
    Transport {
        request: String,
        #[source]
        error: RepoError,
    },

    /// The repository manager refused the promotion
    #[error("Failed to promote: {request}. Reason given was: {message}")]
    Validation { request: String, message: String },

    /// Paths were promoted, the read-only flag could not be set, the
    /// promotion was rolled back
    #[error("Failed to set readonly flag on repo: {store}. Reason given was: {error}")]
    ReadOnly {
        store: String,
        #[source]
        error: RepoError,
    },

    /// Paths were promoted, the read-only flag could not be set, and the
    /// rollback failed too. The stores need manual repair.
    #[error(
        "Failed to set readonly flag on repo: {store}. Reason given was: {error}. \
         Subsequently also failed to rollback the promotion of paths from {source_store} to {target_store}. \
         Reason given was: {rollback_error}"
    )]
    RollbackFailed {
        store: String,
        error: RepoError,
        source_store: String,
        target_store: String,
        rollback_error: RepoError,
    },
}

impl PromotionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PromotionError::Validation { .. })
    }
}
