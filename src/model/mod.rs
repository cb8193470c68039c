//! Data model shared by the driver's subsystems
//!
//! - Store keys naming repository manager stores
//! - The content tracking report
//! - Classified artifacts and their validation
//! - Public request/response types

mod artifact;
mod request;
mod store;
mod tracking;
mod validation;

pub use artifact::{
    BuildCategory, BuildType, RepositoryArtifact, RepositoryType, TargetRepository, INDY_HTTP,
    INDY_MAVEN, INDY_NPM,
};
pub use request::{
    CollectRequest, CreateRequest, CreateResponse, Header, HttpMethod, PromoteRequest,
    PromoteResult, Request, Status,
};
pub use store::{
    InvalidStoreKey, PackageType, StoreKey, StoreType, GENERIC_PKG_KEY, GRADLE_PLUGINS_REPO,
    MAVEN_PKG_KEY, NPM_PKG_KEY, PUBLIC_GROUP_ID, SHARED_IMPORTS_ID, TEMPORARY_BUILDS_GROUP,
    UNTESTED_BUILDS_GROUP,
};
pub use tracking::{TrackedContent, TrackedContentEntry, TrackingKey};
pub use validation::{ArtifactValidator, DefaultArtifactValidator, Violation};
