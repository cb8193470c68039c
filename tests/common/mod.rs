//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use repository_driver::config::DriverConfig;
use repository_driver::driver::Driver;
use repository_driver::filter::PatternArtifactFilter;
use repository_driver::model::{
    DefaultArtifactValidator, PackageType, PromoteResult, StoreKey, TrackedContent,
    TrackedContentEntry,
};
use repository_driver::notify::RetryPolicy;
use repository_driver::repo::{ArtifactStore, InMemoryRepositoryManager};

pub const SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
pub const SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
pub const BUILD_ID: &str = "build-1";

#[path = "../../src/notify/testing.rs"]
mod receiver;

pub use receiver::Receiver;

/// Decoding of the callback bodies a receiver collected.
pub trait PromoteResults {
    /// Last body, decoded as a promotion result
    fn last_result(&self) -> PromoteResult;
}

impl PromoteResults for Receiver {
    fn last_result(&self) -> PromoteResult {
        let bodies = self.bodies();
        let last = bodies.last().expect("no request received");
        serde_json::from_str(last).unwrap()
    }
}

/// Starts a receiver on a free local port, failing its first `failures`
/// requests with 500; returns its base URL.
pub async fn start_receiver(failures: usize) -> (String, Arc<Receiver>) {
    receiver::start(failures).await
}

pub fn key(s: &str) -> StoreKey {
    s.parse().unwrap()
}

pub fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        max_duration: Duration::from_secs(5),
    }
}

/// Repository manager with the stores a provisioned Maven build sees.
pub fn maven_repository() -> Arc<InMemoryRepositoryManager> {
    let repository = Arc::new(InMemoryRepositoryManager::new("http://indy"));
    repository.add_store(ArtifactStore::remote(
        key("maven:remote:central"),
        "https://repo1.maven.org/maven2",
    ));
    repository.add_store(ArtifactStore::hosted(key("maven:hosted:shared-imports")));
    repository.add_store(ArtifactStore::hosted(key("maven:hosted:pnc-builds")));
    repository.add_store(ArtifactStore::hosted(key("maven:hosted:temporary-builds")));
    repository.add_store(ArtifactStore::hosted(StoreKey::hosted(
        PackageType::Maven,
        BUILD_ID,
    )));
    repository.add_store(ArtifactStore::group(
        StoreKey::group(PackageType::Maven, BUILD_ID),
        vec![StoreKey::hosted(PackageType::Maven, BUILD_ID)],
    ));
    repository
}

pub fn driver(repository: Arc<InMemoryRepositoryManager>) -> Arc<Driver> {
    Arc::new(
        Driver::with_retry_policy(
            &DriverConfig::new("http://indy"),
            repository,
            Arc::new(PatternArtifactFilter::new()),
            Arc::new(DefaultArtifactValidator),
            fast_retries(),
        )
        .unwrap(),
    )
}

pub fn maven_download(path: &str) -> TrackedContentEntry {
    TrackedContentEntry::new(key("maven:remote:central"), path)
        .with_origin_url(format!("https://repo1.maven.org/maven2/{}", path))
        .with_size(1024)
        .with_sha1(SHA1)
}

pub fn maven_upload(path: &str) -> TrackedContentEntry {
    TrackedContentEntry::new(StoreKey::hosted(PackageType::Maven, BUILD_ID), path)
        .with_local_url(format!("http://indy/api/content/maven/hosted/{}/{}", BUILD_ID, path))
        .with_size(2048)
        .with_sha256(SHA256)
}

/// Report of a build that downloaded one jar and deployed one jar
pub fn maven_report() -> TrackedContent {
    TrackedContent::new(BUILD_ID)
        .with_download(maven_download("org/x/y/1.0/y-1.0.jar"))
        .with_upload(maven_upload("org/acme/app/2.0/app-2.0.jar"))
}
