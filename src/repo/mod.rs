//! Repository manager client
//!
//! The repository manager owns every store and the content tracking
//! records. This module defines the calls the driver makes against it, an
//! HTTP implementation and an in-memory implementation.

mod errors;
pub mod http;
pub mod memory;
mod types;

pub use errors::{RepoError, RepoResult};
pub use http::HttpRepositoryManager;
pub use memory::InMemoryRepositoryManager;
pub use types::{
    ArtifactStore, PathsPromoteRequest, PathsPromoteResult, ValidationResult,
};

use async_trait::async_trait;

use crate::model::{StoreKey, TrackedContent};

/// Calls made against the repository manager.
#[async_trait]
pub trait RepositoryManager: Send + Sync {
    async fn store_exists(&self, key: &StoreKey) -> RepoResult<bool>;

    async fn create_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()>;

    async fn load_store(&self, key: &StoreKey) -> RepoResult<ArtifactStore>;

    async fn update_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()>;

    async fn delete_store(&self, key: &StoreKey, changelog: &str) -> RepoResult<()>;

    /// Promote paths. A rejected promotion is `Ok` with a result that did not
    /// succeed; `Err` means the call itself failed.
    async fn promote_by_path(&self, request: &PathsPromoteRequest)
        -> RepoResult<PathsPromoteResult>;

    /// Undo a completed promotion.
    async fn rollback_path_promote(
        &self,
        result: &PathsPromoteResult,
    ) -> RepoResult<PathsPromoteResult>;

    /// Create an empty tracking record so builds that transfer nothing still have one.
    async fn init_tracking_report(&self, build_id: &str) -> RepoResult<()>;

    /// Seal the tracking record; `false` when there was nothing to seal.
    async fn seal_tracking_record(&self, build_id: &str) -> RepoResult<bool>;

    async fn get_tracking_report(&self, build_id: &str) -> RepoResult<Option<TrackedContent>>;

    /// Content path of a store relative to the API root
    fn content_path(&self, key: &StoreKey) -> String {
        format!(
            "content/{}/{}/{}",
            key.package_type(),
            key.store_type(),
            key.name()
        )
    }

    /// URL through which a build's transfers via `key` are tracked under `build_id`
    fn tracking_url(&self, build_id: &str, key: &StoreKey) -> String;
}
