//! Asynchronous promotion
//!
//! `promote` schedules one job per build and returns. The job runs its
//! steps strictly in order and ends with exactly one callback:
//!
//! 1. seal and fetch the tracking report
//! 2. classify downloads, then uploads
//! 3. delete the build group
//! 4. promote downloads into shared imports
//! 5. promote uploads into the build promotion target
//!
//! A heartbeat precedes every long step. A step that panics ends the job
//! with a `SYSTEM_ERROR` callback like any other failure.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;
use uuid::Uuid;

use crate::model::{PackageType, PromoteRequest, PromoteResult, Request, Status, StoreKey};
use crate::observability::{ObservationScope, USER_LOG};
use crate::promote::{PromotionPaths, ReadOnlyFlags};

use super::errors::{DriverError, DriverResult};
use super::Driver;

impl Driver {
    /// Schedules the promotion of a finished build and returns at once.
    ///
    /// Fails with `Stopping` when shutdown has begun; nothing is scheduled
    /// then. The returned handle completes after the callback attempt.
    pub fn promote(self: &Arc<Self>, request: PromoteRequest) -> DriverResult<JoinHandle<()>> {
        if self.lifecycle.is_shutting_down() {
            self.metrics.increment_promotions_rejected();
            return Err(DriverError::Stopping);
        }
        if request.build_content_id.trim().is_empty() {
            return Err(DriverError::InvalidRequest(
                "buildContentId must not be blank".to_string(),
            ));
        }

        let span = tracing::info_span!(
            "promotion",
            build_id = %request.build_content_id,
            job_id = %Uuid::new_v4()
        );
        let driver = Arc::clone(self);

        Ok(tokio::spawn(
            async move {
                let _active = driver.lifecycle.track();
                driver.metrics.increment_promotions_started();

                // a panicking step still ends in a callback
                let steps = {
                    let driver = Arc::clone(&driver);
                    let request = request.clone();
                    tokio::spawn(
                        async move { driver.run_promotion(&request).await }.in_current_span(),
                    )
                };

                let result = match steps.await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        tracing::error!(kind = ?e.kind(), error = %e, "Promotion failed");
                        PromoteResult::failed(&request.build_content_id, e.to_string(), e.status())
                    }
                    Err(e) => {
                        let reason = abort_reason(e);
                        tracing::error!(error = %reason, "Promotion aborted");
                        PromoteResult::failed(
                            &request.build_content_id,
                            format!(
                                "Unexpected failure while promoting build {}: {}",
                                request.build_content_id, reason
                            ),
                            Status::SystemError,
                        )
                    }
                };
                if result.status == Status::Success {
                    driver.metrics.increment_promotions_succeeded();
                } else {
                    driver.metrics.increment_promotions_failed();
                }

                driver.notifier.notify(&request.callback, &result).await;
            }
            .instrument(span),
        ))
    }

    async fn run_promotion(&self, request: &PromoteRequest) -> DriverResult<PromoteResult> {
        let build_id = request.build_content_id.as_str();
        let heart_beat = request.heart_beat.as_ref();
        let package_type = request.build_type.package_type();

        let report = self.retrieve_tracking_report(build_id, true).await?;

        let scope = ObservationScope::new("Process artifacts downloaded by build");
        tracing::info!(target: USER_LOG, "Processing dependencies");
        let downloaded = match self.classifier.collect_downloaded_artifacts(&report) {
            Ok(artifacts) => {
                scope.complete();
                artifacts
            }
            Err(e) => {
                scope.fail(&e.to_string());
                tracing::error!(target: USER_LOG, "Dependencies promotion failed. Error(s): {}", e);
                return Err(e.into());
            }
        };

        let uploaded = self.classifier.collect_uploaded_artifacts(
            &report,
            request.temp_build,
            request.build_category,
        )?;

        // promotion starts only once both directions are classified
        self.heartbeat.send(heart_beat);
        self.delete_build_group(&package_type, build_id).await?;

        self.heartbeat.send(heart_beat);
        let downloads = self.planner.collect_downloads_promotions(&report);
        self.promote_downloads(downloads, heart_beat, request.temp_build)
            .await?;

        self.heartbeat.send(heart_beat);
        let uploads = self.planner.collect_uploads_promotions(
            &report,
            request.temp_build,
            &package_type,
            build_id,
        );
        self.promote_uploads(uploads, heart_beat, request.temp_build)
            .await?;

        tracing::info!(
            built_artifacts = uploaded.len(),
            dependencies = downloaded.len(),
            "Returning built artifacts / dependencies"
        );
        Ok(PromoteResult::success(build_id, uploaded, downloaded))
    }

    async fn delete_build_group(&self, package_type: &PackageType, build_id: &str) -> DriverResult<()> {
        let scope = ObservationScope::new(format!("Removing build aggregation group: {}", build_id));
        tracing::info!(target: USER_LOG, "Removing build aggregation group");

        let key = StoreKey::group(package_type.clone(), build_id);
        let changelog = format!("[Post-Build] Removing build aggregation group: {}", build_id);
        match self.repository.delete_store(&key, &changelog).await {
            Ok(()) => {
                scope.complete();
                Ok(())
            }
            Err(error) => {
                scope.fail(&error.to_string());
                Err(DriverError::GroupRemoval {
                    group: key.to_string(),
                    error,
                })
            }
        }
    }

    /// Dependencies not captured elsewhere go to shared imports.
    async fn promote_downloads(
        &self,
        promotions: PromotionPaths,
        heart_beat: Option<&Request>,
        temp_build: bool,
    ) -> DriverResult<()> {
        for request in promotions.requests() {
            self.heartbeat.send(heart_beat);
            let flags = ReadOnlyFlags::for_download(&request.target, temp_build);

            let scope = ObservationScope::new(format!(
                "doPromoteByPath: source: '{}', target: '{}', readonly: {}",
                request.source, request.target, flags.target
            ));
            tracing::info!(
                target: USER_LOG,
                "Promoting {} dependencies from {} to {}",
                request.paths.len(),
                request.source,
                request.target
            );

            if let Err(e) = self.executor.promote_by_path(request, flags).await {
                scope.fail(&e.to_string());
                tracing::error!(target: USER_LOG, "Failed to promote by path. Error(s): {}", e);
                return Err(e.into());
            }
            scope.complete();
        }
        Ok(())
    }

    /// Build output goes to the build promotion target; the build's hosted
    /// store is locked for permanent builds.
    async fn promote_uploads(
        &self,
        promotions: PromotionPaths,
        heart_beat: Option<&Request>,
        temp_build: bool,
    ) -> DriverResult<()> {
        tracing::info!(target: USER_LOG, "Validating and promoting built artifacts");
        let scope = ObservationScope::new("promotion to build content set");

        for request in promotions.requests() {
            self.heartbeat.send(heart_beat);
            if let Err(e) = self
                .executor
                .promote_by_path(request, ReadOnlyFlags::for_upload(temp_build))
                .await
            {
                scope.fail(&e.to_string());
                tracing::error!(target: USER_LOG, "Built artifact promotion failed. Error(s): {}", e);
                return Err(e.into());
            }
        }

        scope.complete();
        Ok(())
    }
}

/// Panic payload or cancellation of an aborted promotion task.
fn abort_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic".to_string()
    }
}
