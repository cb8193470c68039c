//! Promotion Flow Tests
//!
//! End-to-end runs of `promote` against the in-memory repository manager,
//! with a local HTTP receiver standing in for the caller's callback and
//! heartbeat endpoints.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use repository_driver::config::DriverConfig;
use repository_driver::driver::{Driver, DriverError, ErrorKind};
use repository_driver::filter::PatternArtifactFilter;
use repository_driver::model::{
    BuildCategory, BuildType, DefaultArtifactValidator, HttpMethod, PackageType, PromoteRequest,
    Request, Status, StoreKey, TrackedContent, TrackedContentEntry,
};
use repository_driver::repo::memory::{Call, Operation};
use repository_driver::repo::{
    ArtifactStore, InMemoryRepositoryManager, PathsPromoteRequest, PathsPromoteResult,
    RepoResult, RepositoryManager, ValidationResult,
};

fn promote_request(callback_base: &str, heart_beat_base: Option<&str>) -> PromoteRequest {
    PromoteRequest {
        build_content_id: BUILD_ID.to_string(),
        build_type: BuildType::Mvn,
        temp_build: false,
        build_category: BuildCategory::Standard,
        callback: Request::new(HttpMethod::Post, format!("{}/callback", callback_base))
            .with_header("Authorization", "Bearer secret"),
        heart_beat: heart_beat_base
            .map(|base| Request::new(HttpMethod::Post, format!("{}/heartbeat", base))),
    }
}

fn build_hosted() -> StoreKey {
    StoreKey::hosted(PackageType::Maven, BUILD_ID)
}

fn build_group() -> StoreKey {
    StoreKey::group(PackageType::Maven, BUILD_ID)
}

// =============================================================================
// Successful Promotion
// =============================================================================

/// A Maven build's dependency is imported with its checksum sidecars and
/// its output is promoted and locked.
#[tokio::test]
async fn test_maven_build_is_promoted() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.build_content_id, BUILD_ID);
    assert_eq!(result.dependencies.len(), 1);
    assert_eq!(result.dependencies[0].identifier, "org.x:y:jar:1.0");
    assert_eq!(
        result.dependencies[0].origin_url.as_deref(),
        Some("https://repo1.maven.org/maven2/org/x/y/1.0/y-1.0.jar")
    );
    assert_eq!(result.built_artifacts.len(), 1);
    assert_eq!(result.built_artifacts[0].identifier, "org.acme:app:jar:2.0");
    assert_eq!(
        result.built_artifacts[0].build_category,
        Some(BuildCategory::Standard)
    );

    let shared_imports = repository.content(&key("maven:hosted:shared-imports"));
    assert!(shared_imports.contains("org/x/y/1.0/y-1.0.jar"));
    assert!(shared_imports.contains("org/x/y/1.0/y-1.0.jar.md5"));
    assert!(shared_imports.contains("org/x/y/1.0/y-1.0.jar.sha1"));

    let builds = repository.content(&key("maven:hosted:pnc-builds"));
    assert!(builds.contains("org/acme/app/2.0/app-2.0.jar"));
    assert!(builds.contains("org/acme/app/2.0/app-2.0.jar.md5"));

    assert!(repository.store(&build_hosted()).unwrap().readonly);
    assert!(!repository.store(&key("maven:hosted:shared-imports")).unwrap().readonly);
    assert!(repository.store(&build_group()).is_none());
    assert!(repository.is_sealed(BUILD_ID));
}

/// Steps run in a fixed order: seal, report, group deletion, downloads,
/// uploads, read-only flag.
#[tokio::test]
async fn test_steps_run_in_order() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, _callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let calls = repository.calls();
    assert_eq!(calls.len(), 6, "{:?}", calls);
    assert_eq!(calls[0], Call::SealTrackingRecord(BUILD_ID.to_string()));
    assert_eq!(calls[1], Call::GetTrackingReport(BUILD_ID.to_string()));
    assert_eq!(calls[2], Call::DeleteStore(build_group()));
    assert_eq!(
        calls[3],
        Call::Promote(PathsPromoteRequest::new(
            key("maven:remote:central"),
            key("maven:hosted:shared-imports"),
            vec![
                "org/x/y/1.0/y-1.0.jar".to_string(),
                "org/x/y/1.0/y-1.0.jar.md5".to_string(),
                "org/x/y/1.0/y-1.0.jar.sha1".to_string(),
            ],
        ))
    );
    match &calls[4] {
        Call::Promote(request) => {
            assert_eq!(request.source, build_hosted());
            assert_eq!(request.target, key("maven:hosted:pnc-builds"));
            assert!(!request.purge_source);
        }
        other => panic!("expected upload promotion, got {:?}", other),
    }
    match &calls[5] {
        Call::UpdateStore(store) => {
            assert_eq!(store.key, build_hosted());
            assert!(store.readonly);
        }
        other => panic!("expected readonly update, got {:?}", other),
    }
}

/// Temporary builds promote into the temporary target and keep their
/// hosted store writable.
#[tokio::test]
async fn test_temporary_build_is_not_locked() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    let mut request = promote_request(&base, None);
    request.temp_build = true;
    driver.promote(request).unwrap().await.unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::Success);
    assert!(result.built_artifacts[0].target_repository.temporary_repo);
    assert!(repository
        .content(&key("maven:hosted:temporary-builds"))
        .contains("org/acme/app/2.0/app-2.0.jar"));
    assert!(repository.content(&key("maven:hosted:pnc-builds")).is_empty());
    assert!(!repository.store(&build_hosted()).unwrap().readonly);
}

/// Downloads from two coordinates of the same remote go out in one call.
#[tokio::test]
async fn test_downloads_from_one_source_coalesce() {
    let repository = maven_repository();
    repository.put_tracking_report(
        TrackedContent::new(BUILD_ID)
            .with_download(maven_download("org/x/z/2.0/z-2.0.pom"))
            .with_download(maven_download("org/x/y/1.0/y-1.0.jar"))
            .with_download(maven_download("org/x/y/1.0/y-1.0.jar")),
    );
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let promotions = repository.promotions();
    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].paths.len(), 6);

    let identifiers: Vec<_> = callback
        .last_result()
        .dependencies
        .iter()
        .map(|a| a.identifier.clone())
        .collect();
    let mut sorted = identifiers.clone();
    sorted.sort();
    assert_eq!(identifiers, sorted);
}

// =============================================================================
// Failures
// =============================================================================

/// A rejected promotion is reported as FAILED with the rule messages.
#[tokio::test]
async fn test_rejected_promotion_reports_failed() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    repository.reject_promotions_to(
        key("maven:hosted:pnc-builds"),
        ValidationResult::failed("pnc-builds-rules")
            .with_error("no-pre-existing-paths", "org/acme/app/2.0/app-2.0.jar exists"),
    );
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::Failed);
    assert!(result
        .message
        .contains("One or more validation rules failed in rule-set pnc-builds-rules"));
    assert!(result.message.contains("- no-pre-existing-paths:"));
    assert!(result.built_artifacts.is_empty());
    assert!(!repository.store(&build_hosted()).unwrap().readonly);
    assert_eq!(driver.metrics().snapshot().promotions_failed, 1);
}

/// A failed read-only flip is rolled back and still reported as a failure.
#[tokio::test]
async fn test_readonly_failure_after_rollback_still_fails() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    repository.fail(Operation::UpdateStore, "store is locked");
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result
        .message
        .contains("Failed to set readonly flag on repo: maven:hosted:build-1"));
    assert_eq!(repository.rollbacks().len(), 1);
    assert!(repository.content(&key("maven:hosted:pnc-builds")).is_empty());
    assert_eq!(driver.metrics().snapshot().rollbacks, 1);
}

/// Read-only flip and rollback both failing is a system error naming both.
#[tokio::test]
async fn test_rollback_failure_reports_both_errors() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    repository.fail(Operation::UpdateStore, "store is locked");
    repository.fail(Operation::RollbackPathPromote, "rollback refused");
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result.message.contains("store is locked"));
    assert!(result.message.contains("rollback refused"));
}

/// An unsealable report fails the job before anything is touched.
#[tokio::test]
async fn test_missing_tracking_record() {
    let repository = maven_repository();
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert_eq!(
        result.message,
        "Failed to seal content-tracking record for: build-1."
    );
    assert!(repository.store(&build_group()).is_some());
}

/// Unsupported downloads stop the job before the group is deleted.
#[tokio::test]
async fn test_unsupported_download_is_system_error() {
    let repository = maven_repository();
    repository.put_tracking_report(
        TrackedContent::new(BUILD_ID).with_download(
            TrackedContentEntry::new(key("rpm:remote:fedora"), "x/y.rpm")
                .with_size(1)
                .with_sha256(SHA256),
        ),
    );
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result.message.contains("not supported for downloads"));
    assert!(repository.store(&build_group()).is_some());
    assert!(repository.promotions().is_empty());
}

/// Build output of an ecosystem without upload rules aborts the whole job.
#[tokio::test]
async fn test_unsupported_upload_is_system_error() {
    let repository = maven_repository();
    repository.put_tracking_report(
        maven_report().with_upload(
            TrackedContentEntry::new(key("generic-http:hosted:build-1"), "site/index.html")
                .with_size(1)
                .with_sha256(SHA256),
        ),
    );
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result.message.contains("not supported for uploads"));
    assert!(result.built_artifacts.is_empty());
    assert!(repository.store(&build_group()).is_some());
    assert!(repository.promotions().is_empty());
}

/// Group deletion failing stops the job before any promotion.
#[tokio::test]
async fn test_group_deletion_failure() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    repository.fail(Operation::DeleteStore, "indy unavailable");
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result.message.contains("indy unavailable"));
    assert!(repository.promotions().is_empty());
}

// =============================================================================
// Lifecycle, Callbacks, Heartbeats
// =============================================================================

/// No promotion is scheduled once shutdown has begun.
#[tokio::test]
async fn test_promote_while_stopping_is_rejected() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    driver.lifecycle().begin_shutdown();
    let err = driver.promote(promote_request(&base, None)).unwrap_err();

    assert!(matches!(err, DriverError::Stopping));
    assert_eq!(err.kind(), ErrorKind::Stopping);
    assert_eq!(driver.lifecycle().active_promotions(), 0);
    assert_eq!(driver.metrics().snapshot().promotions_started, 0);
    assert_eq!(driver.metrics().snapshot().promotions_rejected, 1);
    assert!(repository.calls().is_empty());
    assert_eq!(callback.count(), 0);
}

/// The active counter drops back to zero however the job ends.
#[tokio::test]
async fn test_active_counter_returns_to_zero() {
    let repository = maven_repository();
    let driver = driver(repository.clone());
    let (base, _callback) = start_receiver(0).await;

    // no report: the job fails
    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    assert_eq!(driver.lifecycle().active_promotions(), 0);
    assert!(driver
        .lifecycle()
        .wait_for_idle(std::time::Duration::from_millis(10))
        .await);
}

/// A callback answered 500 three times is delivered on the fourth attempt.
#[tokio::test]
async fn test_callback_retried_until_accepted() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(3).await;

    driver
        .promote(promote_request(&base, None))
        .unwrap()
        .await
        .unwrap();

    assert_eq!(callback.count(), 4);
    assert_eq!(callback.last_result().status, Status::Success);
    let snapshot = driver.metrics().snapshot();
    assert_eq!(snapshot.callbacks_delivered, 1);
    assert_eq!(snapshot.callbacks_undelivered, 0);
    assert_eq!(snapshot.promotions_succeeded, 1);
}

/// Heartbeats precede group deletion, each promotion phase and each
/// promotion call.
#[tokio::test]
async fn test_heartbeats_sent_during_promotion() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (callback_base, _callback) = start_receiver(0).await;
    let (heart_beat_base, heart_beats) = start_receiver(0).await;

    driver
        .promote(promote_request(&callback_base, Some(&heart_beat_base)))
        .unwrap()
        .await
        .unwrap();

    heart_beats.wait_for(5).await;
    assert_eq!(heart_beats.count(), 5);
    assert!(heart_beats.bodies().iter().all(|b| b.is_empty()));
}

/// Jobs of different builds run independently.
#[tokio::test]
async fn test_concurrent_jobs() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());
    let (base, callback) = start_receiver(0).await;

    let mut other = promote_request(&base, None);
    other.build_content_id = "build-2".to_string();

    let first = driver.promote(promote_request(&base, None)).unwrap();
    let second = driver.promote(other).unwrap();
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(callback.count(), 2);
    let statuses: Vec<Status> = callback
        .bodies()
        .iter()
        .map(|b| serde_json::from_str::<repository_driver::model::PromoteResult>(b).unwrap().status)
        .collect();
    assert!(statuses.contains(&Status::Success));
    assert!(statuses.contains(&Status::SystemError));
    assert_eq!(driver.lifecycle().active_promotions(), 0);
}

/// Delegates to the in-memory manager but panics when sealing.
struct PanicOnSeal(Arc<InMemoryRepositoryManager>);

#[async_trait]
impl RepositoryManager for PanicOnSeal {
    async fn store_exists(&self, key: &StoreKey) -> RepoResult<bool> {
        self.0.store_exists(key).await
    }

    async fn create_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()> {
        self.0.create_store(store, changelog).await
    }

    async fn load_store(&self, key: &StoreKey) -> RepoResult<ArtifactStore> {
        self.0.load_store(key).await
    }

    async fn update_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()> {
        self.0.update_store(store, changelog).await
    }

    async fn delete_store(&self, key: &StoreKey, changelog: &str) -> RepoResult<()> {
        self.0.delete_store(key, changelog).await
    }

    async fn promote_by_path(
        &self,
        request: &PathsPromoteRequest,
    ) -> RepoResult<PathsPromoteResult> {
        self.0.promote_by_path(request).await
    }

    async fn rollback_path_promote(
        &self,
        result: &PathsPromoteResult,
    ) -> RepoResult<PathsPromoteResult> {
        self.0.rollback_path_promote(result).await
    }

    async fn init_tracking_report(&self, build_id: &str) -> RepoResult<()> {
        self.0.init_tracking_report(build_id).await
    }

    async fn seal_tracking_record(&self, build_id: &str) -> RepoResult<bool> {
        panic!("tracking record of {} is corrupt", build_id)
    }

    async fn get_tracking_report(&self, build_id: &str) -> RepoResult<Option<TrackedContent>> {
        self.0.get_tracking_report(build_id).await
    }

    fn tracking_url(&self, build_id: &str, key: &StoreKey) -> String {
        self.0.tracking_url(build_id, key)
    }
}

/// A step that panics still ends the job with one SYSTEM_ERROR callback.
#[tokio::test]
async fn test_panicking_step_still_calls_back() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = Arc::new(
        Driver::with_retry_policy(
            &DriverConfig::new("http://indy"),
            Arc::new(PanicOnSeal(repository.clone())),
            Arc::new(PatternArtifactFilter::new()),
            Arc::new(DefaultArtifactValidator),
            fast_retries(),
        )
        .unwrap(),
    );
    let (base, callback) = start_receiver(0).await;

    let job = driver.promote(promote_request(&base, None)).unwrap().await;

    assert!(job.is_ok());
    assert_eq!(callback.count(), 1);
    let result = callback.last_result();
    assert_eq!(result.status, Status::SystemError);
    assert!(result.message.contains("tracking record of build-1 is corrupt"));
    assert!(result.built_artifacts.is_empty());

    let snapshot = driver.metrics().snapshot();
    assert_eq!(snapshot.callbacks_delivered, 1);
    assert_eq!(snapshot.promotions_failed, 1);
    assert_eq!(driver.lifecycle().active_promotions(), 0);
    assert!(repository.store(&build_group()).is_some());
}
