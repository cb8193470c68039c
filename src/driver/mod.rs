//! Repository driver
//!
//! Public operations of the service:
//!
//! - `create`: provision the stores a build resolves and deploys through
//! - `promote`: asynchronously classify and promote a finished build,
//!   then report through the caller's callback
//! - `collect_repo_manager_result`: classify without promoting

mod errors;
mod orchestrator;
mod provision;

pub use errors::{DriverError, DriverResult, ErrorKind};
pub use provision::Provisioner;

use std::sync::Arc;

use crate::classifier::ArtifactClassifier;
use crate::config::DriverConfig;
use crate::filter::ArtifactFilter;
use crate::lifecycle::Lifecycle;
use crate::model::{
    ArtifactValidator, CollectRequest, CreateRequest, CreateResponse, PromoteResult, Status,
    TrackedContent,
};
use crate::notify::{CallbackNotifier, HeartbeatSender, RetryPolicy};
use crate::observability::{DriverMetrics, USER_LOG};
use crate::promote::{PromotionExecutor, PromotionPlanner};
use crate::repo::RepositoryManager;

/// The repository driver service.
pub struct Driver {
    repository: Arc<dyn RepositoryManager>,
    provisioner: Provisioner,
    classifier: ArtifactClassifier,
    planner: PromotionPlanner,
    executor: PromotionExecutor,
    notifier: CallbackNotifier,
    heartbeat: HeartbeatSender,
    lifecycle: Arc<Lifecycle>,
    metrics: Arc<DriverMetrics>,
}

impl Driver {
    pub fn new(
        config: &DriverConfig,
        repository: Arc<dyn RepositoryManager>,
        filter: Arc<dyn ArtifactFilter>,
        validator: Arc<dyn ArtifactValidator>,
    ) -> DriverResult<Self> {
        Self::with_retry_policy(
            config,
            repository,
            filter,
            validator,
            RetryPolicy::from_config(config),
        )
    }

    /// Like `new`, with an explicit callback retry schedule.
    pub fn with_retry_policy(
        config: &DriverConfig,
        repository: Arc<dyn RepositoryManager>,
        filter: Arc<dyn ArtifactFilter>,
        validator: Arc<dyn ArtifactValidator>,
        policy: RetryPolicy,
    ) -> DriverResult<Self> {
        let metrics = Arc::new(DriverMetrics::new());
        let targets = config.promotion_targets();
        let timeout = config.http_client_request_timeout();

        Ok(Self {
            provisioner: Provisioner::new(repository.clone()),
            classifier: ArtifactClassifier::new(
                filter.clone(),
                validator,
                repository.clone(),
                targets.clone(),
            ),
            planner: PromotionPlanner::new(filter, targets),
            executor: PromotionExecutor::new(repository.clone(), metrics.clone()),
            notifier: CallbackNotifier::new(timeout, policy, metrics.clone())?,
            heartbeat: HeartbeatSender::new(timeout, metrics.clone())?,
            lifecycle: Arc::new(Lifecycle::new()),
            repository,
            metrics,
        })
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn metrics(&self) -> &Arc<DriverMetrics> {
        &self.metrics
    }

    /// Provisions the build's stores and returns its tracking URLs.
    pub async fn create(&self, request: &CreateRequest) -> DriverResult<CreateResponse> {
        let response = self.provisioner.create(request).await?;
        self.metrics.increment_builds_created();
        Ok(response)
    }

    /// Classifies a build's tracking report without sealing it, deleting
    /// the group or promoting anything.
    ///
    /// Tracking failures are errors; classification failures come back as
    /// a `FAILED` result with empty artifact lists.
    pub async fn collect_repo_manager_result(
        &self,
        request: &CollectRequest,
    ) -> DriverResult<PromoteResult> {
        let build_id = request.build_content_id.as_str();
        let report = self.retrieve_tracking_report(build_id, false).await?;

        let collected = self
            .classifier
            .collect_downloaded_artifacts(&report)
            .and_then(|downloaded| {
                self.classifier
                    .collect_uploaded_artifacts(&report, request.temp_build, request.build_category)
                    .map(|uploaded| (uploaded, downloaded))
            });

        match collected {
            Ok((uploaded, downloaded)) => {
                tracing::info!(
                    build_id,
                    built_artifacts = uploaded.len(),
                    dependencies = downloaded.len(),
                    "Returning built artifacts / dependencies"
                );
                Ok(PromoteResult::success(build_id, uploaded, downloaded))
            }
            Err(e) => {
                tracing::error!(target: USER_LOG, "Failed to collect artifacts. Error(s): {}", e);
                Ok(PromoteResult::failed(build_id, e.to_string(), Status::Failed))
            }
        }
    }

    async fn retrieve_tracking_report(
        &self,
        build_id: &str,
        seal: bool,
    ) -> DriverResult<TrackedContent> {
        let tracking_error = |e: crate::repo::RepoError| {
            DriverError::Tracking(format!(
                "Failed to retrieve tracking report for: {}. Reason: {}",
                build_id, e
            ))
        };

        if seal {
            tracing::info!(target: USER_LOG, "Sealing tracking record");
            let sealed = self
                .repository
                .seal_tracking_record(build_id)
                .await
                .map_err(|e| {
                    DriverError::Tracking(format!(
                        "Failed to seal content-tracking record for: {}. Reason: {}",
                        build_id, e
                    ))
                })?;
            if !sealed {
                return Err(DriverError::Tracking(format!(
                    "Failed to seal content-tracking record for: {}.",
                    build_id
                )));
            }
        }

        tracing::info!(target: USER_LOG, "Getting tracking report");
        self.repository
            .get_tracking_report(build_id)
            .await
            .map_err(tracking_error)?
            .ok_or_else(|| {
                DriverError::Tracking(format!(
                    "Failed to retrieve tracking report for: {}.",
                    build_id
                ))
            })
    }
}
