//! # Driver Errors
//!
//! Top-level errors of the three public operations. Each error belongs to
//! one `ErrorKind`, which fixes the status reported in the callback and the
//! HTTP status of the REST surface.

use thiserror::Error;

use crate::classifier::ClassificationError;
use crate::model::Status;
use crate::notify::NotifyError;
use crate::promote::PromotionError;
use crate::repo::RepoError;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Failure classes of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store or group provisioning failed
    Setup,
    /// Sealing or fetching the tracking report failed
    Tracking,
    /// Unsupported ecosystem or invalid artifact records
    Classification,
    /// The repository manager refused a promotion
    PromotionValidation,
    /// Read-only flag and rollback both failed
    RollbackCompound,
    /// A repository manager call failed
    Transport,
    /// The driver is shutting down
    Stopping,
    /// Malformed caller input
    InvalidRequest,
}

impl ErrorKind {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Setup => "DRIVER_SETUP_ERROR",
            ErrorKind::Tracking => "DRIVER_TRACKING_ERROR",
            ErrorKind::Classification => "DRIVER_CLASSIFICATION_ERROR",
            ErrorKind::PromotionValidation => "DRIVER_PROMOTION_REJECTED",
            ErrorKind::RollbackCompound => "DRIVER_ROLLBACK_FAILED",
            ErrorKind::Transport => "DRIVER_TRANSPORT_ERROR",
            ErrorKind::Stopping => "DRIVER_STOPPING",
            ErrorKind::InvalidRequest => "DRIVER_INVALID_REQUEST",
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to setup repository or repository group for this build: {reason}")]
    Setup { reason: String },

    #[error("{0}")]
    Tracking(String),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error("Failed to remove build aggregation group {group}. Reason: {error}")]
    GroupRemoval {
        group: String,
        #[source]
        error: RepoError,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] NotifyError),

    #[error("Service is stopping, not accepting new promotions")]
    Stopping,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DriverError {
    pub fn setup(reason: impl Into<String>) -> Self {
        DriverError::Setup {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Setup { .. } => ErrorKind::Setup,
            DriverError::Tracking(_) => ErrorKind::Tracking,
            DriverError::Classification(_) => ErrorKind::Classification,
            DriverError::Promotion(PromotionError::Validation { .. }) => {
                ErrorKind::PromotionValidation
            }
            DriverError::Promotion(PromotionError::RollbackFailed { .. }) => {
                ErrorKind::RollbackCompound
            }
            DriverError::Promotion(_) | DriverError::GroupRemoval { .. } | DriverError::Client(_) => {
                ErrorKind::Transport
            }
            DriverError::Stopping => ErrorKind::Stopping,
            DriverError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Status reported in the callback for a job ending with this error
    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::PromotionValidation => Status::Failed,
            _ => Status::SystemError,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}
