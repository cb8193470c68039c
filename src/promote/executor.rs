//! Promotion by path
//!
//! Promotes one (source, target) path set with purge-source off, then
//! optionally flips the source and/or target store to read-only. When a
//! flip fails the promotion is rolled back and the call still fails.

use std::sync::Arc;

use crate::model::{PackageType, StoreKey};
use crate::observability::DriverMetrics;
use crate::repo::{PathsPromoteRequest, PathsPromoteResult, RepoResult, RepositoryManager};

use super::errors::{PromotionError, PromotionResult};

const READONLY_CHANGELOG: &str = "Setting readonly after successful build and promotion.";

/// Which stores become read-only after a successful promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOnlyFlags {
    pub source: bool,
    pub target: bool,
}

impl ReadOnlyFlags {
    /// Dependency imports: only generic-http targets of permanent builds
    /// are locked. The source is a shared remote and never touched.
    pub fn for_download(target: &StoreKey, temp_build: bool) -> Self {
        Self {
            source: false,
            target: !temp_build && *target.package_type() == PackageType::GenericHttp,
        }
    }

    /// Build output: the build's own hosted store is locked for permanent
    /// builds. The target is shared and never touched.
    pub fn for_upload(temp_build: bool) -> Self {
        Self {
            source: !temp_build,
            target: false,
        }
    }
}

/// Runs path promotions against the repository manager.
#[derive(Clone)]
pub struct PromotionExecutor {
    repository: Arc<dyn RepositoryManager>,
    metrics: Arc<DriverMetrics>,
}

impl PromotionExecutor {
    pub fn new(repository: Arc<dyn RepositoryManager>, metrics: Arc<DriverMetrics>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    pub async fn promote_by_path(
        &self,
        mut request: PathsPromoteRequest,
        flags: ReadOnlyFlags,
    ) -> PromotionResult<PathsPromoteResult> {
        request.purge_source = false;

        let result = self
            .repository
            .promote_by_path(&request)
            .await
            .map_err(|error| PromotionError::Transport {
                request: request.to_string(),
                error,
            })?;

        if !result.succeeded() {
            return Err(PromotionError::Validation {
                request: request.to_string(),
                message: validation_error(&result),
            });
        }

        if flags.source {
            self.set_readonly(&request.source, &result).await?;
        }
        if flags.target {
            self.set_readonly(&request.target, &result).await?;
        }

        Ok(result)
    }

    async fn set_readonly(&self, key: &StoreKey, result: &PathsPromoteResult) -> PromotionResult<()> {
        let error = match self.update_readonly(key).await {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        self.metrics.increment_rollbacks();
        match self.repository.rollback_path_promote(result).await {
            Ok(_) => {
                tracing::warn!(store = %key, error = %error, "Rolled back promotion after failing to set readonly");
                Err(PromotionError::ReadOnly {
                    store: key.to_string(),
                    error,
                })
            }
            Err(rollback_error) => {
                tracing::error!(
                    store = %key,
                    error = %error,
                    rollback_error = %rollback_error,
                    "Failed to set readonly flag and to roll back the promotion; stores need manual repair"
                );
                Err(PromotionError::RollbackFailed {
                    store: key.to_string(),
                    error,
                    source_store: result.request.source.to_string(),
                    target_store: result.request.target.to_string(),
                    rollback_error,
                })
            }
        }
    }

    async fn update_readonly(&self, key: &StoreKey) -> RepoResult<()> {
        let mut store = self.repository.load_store(key).await?;
        store.readonly = true;
        self.repository.update_store(&store, READONLY_CHANGELOG).await
    }
}

/// Human-readable reason of a failed promotion.
pub fn validation_error(result: &PathsPromoteResult) -> String {
    let mut message = String::new();

    if let Some(error) = &result.error {
        message.push_str(error);
        if result.validations.is_some() {
            message.push('\n');
        }
    }

    if let Some(validations) = &result.validations {
        if let Some(rule_set) = &validations.rule_set {
            message.push_str("One or more validation rules failed in rule-set ");
            message.push_str(rule_set);
            message.push_str(":\n");

            if validations.validator_errors.is_empty() {
                message.push_str("(no validation errors received)");
            }
            for (rule, error) in &validations.validator_errors {
                message.push_str(&format!("- {}:\n{}\n\n", rule, error));
            }
        }
    }

    if message.is_empty() {
        message.push_str("(no error message received)");
    }
    message
}
