//! Build repository provisioning
//!
//! Every build reads through a group named after its content id and
//! deploys into a hosted store of the same name. Group constituents are
//! ordered by resolution precedence:
//!
//! 1. the build's hosted store
//! 2. global stores of the ecosystem
//! 3. caller-supplied extra remotes, last

use std::sync::Arc;

use crate::model::{
    BuildType, CreateRequest, CreateResponse, PackageType, StoreKey, GRADLE_PLUGINS_REPO,
    PUBLIC_GROUP_ID, SHARED_IMPORTS_ID, TEMPORARY_BUILDS_GROUP, UNTESTED_BUILDS_GROUP,
};
use crate::repo::{ArtifactStore, RepoError, RepositoryManager};

use super::errors::{DriverError, DriverResult};

/// Prefix of remote stores created for extra repositories
const EXTRA_REPO_PREFIX: &str = "i-";

#[derive(Clone)]
pub struct Provisioner {
    repository: Arc<dyn RepositoryManager>,
}

impl Provisioner {
    pub fn new(repository: Arc<dyn RepositoryManager>) -> Self {
        Self { repository }
    }

    /// Ensures the build's hosted store and group exist, initialises its
    /// tracking record, and returns the tracking URLs the build uses.
    pub async fn create(&self, request: &CreateRequest) -> DriverResult<CreateResponse> {
        let build_id = request.build_content_id.as_str();
        if build_id.trim().is_empty() {
            return Err(DriverError::InvalidRequest(
                "buildContentId must not be blank".to_string(),
            ));
        }
        let package_type = request.build_type.package_type();
        let group_key = StoreKey::group(package_type.clone(), build_id);
        let hosted_key = StoreKey::hosted(package_type.clone(), build_id);

        self.setup_build_repos(request, &package_type, &group_key, &hosted_key)
            .await
            .map_err(|e| {
                tracing::debug!(build_id, error = %e, "Failed to setup repository or repository group for this build");
                DriverError::setup(e.to_string())
            })?;

        self.repository
            .init_tracking_report(build_id)
            .await
            .map_err(|e| {
                DriverError::setup(format!(
                    "Failed to initialise the tracking record of {}: {}",
                    build_id, e
                ))
            })?;

        let response = CreateResponse {
            repository_dependency_url: self.repository.tracking_url(build_id, &group_key),
            repository_deploy_url: self.repository.tracking_url(build_id, &hosted_key),
        };
        tracing::info!(
            "Using '{}' for {} repository access in build: {}",
            response.repository_dependency_url,
            package_type,
            build_id
        );
        Ok(response)
    }

    async fn setup_build_repos(
        &self,
        request: &CreateRequest,
        package_type: &PackageType,
        group_key: &StoreKey,
        hosted_key: &StoreKey,
    ) -> Result<(), SetupFailure> {
        let build_id = request.build_content_id.as_str();

        if self.repository.store_exists(group_key).await? {
            tracing::info!(group = %group_key, "Build group already exists");
            return Ok(());
        }

        if !self.repository.store_exists(hosted_key).await? {
            let hosted = ArtifactStore::hosted(hosted_key.clone()).with_description(format!(
                "Build output for {} build #{}",
                package_type, build_id
            ));
            let changelog = format!(
                "Creating hosted repository for {} build: {} (repo: {})",
                package_type, build_id, build_id
            );
            self.repository.create_store(&hosted, &changelog).await?;

            if !self.repository.store_exists(hosted_key).await? {
                return Err(SetupFailure::Missing(hosted_key.clone()));
            }
        }

        let mut constituents = vec![hosted_key.clone()];
        constituents.extend(global_constituents(
            request.build_type,
            package_type,
            request.temp_build,
        )?);
        for key in self
            .extra_constituents(package_type, build_id, &request.extra_repositories)
            .await?
        {
            if !constituents.contains(&key) {
                constituents.push(key);
            }
        }

        let group = ArtifactStore::group(group_key.clone(), constituents).with_description(
            format!(
                "Aggregation group for {}build #{}",
                if request.temp_build { "temporary " } else { "" },
                build_id
            ),
        );
        let changelog = format!(
            "Creating repository group for resolving artifacts (repo: {}).",
            build_id
        );
        self.repository.create_store(&group, &changelog).await?;
        Ok(())
    }

    /// Remote stores for the extra repositories, created when absent.
    async fn extra_constituents(
        &self,
        package_type: &PackageType,
        build_id: &str,
        repositories: &[String],
    ) -> Result<Vec<StoreKey>, SetupFailure> {
        let mut keys = Vec::new();

        for url in repositories.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let key = StoreKey::remote(package_type.clone(), extra_repository_name(url)?);
            if keys.contains(&key) {
                continue;
            }
            if !self.repository.store_exists(&key).await? {
                let remote = ArtifactStore::remote(key.clone(), url)
                    .with_description(format!("Extra dependency repository {}", url));
                let changelog = format!(
                    "Creating extra dependency repository {} for build: {}",
                    url, build_id
                );
                self.repository.create_store(&remote, &changelog).await?;
            }
            keys.push(key);
        }

        Ok(keys)
    }
}

/// Internal failure of provisioning, reported as a setup error.
#[derive(Debug, thiserror::Error)]
enum SetupFailure {
    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Store {0} does not exist after being created")]
    Missing(StoreKey),

    #[error("Invalid extra repository '{url}': {reason}")]
    InvalidRepository { url: String, reason: String },
}

fn global_constituents(
    build_type: BuildType,
    package_type: &PackageType,
    temp_build: bool,
) -> Result<Vec<StoreKey>, SetupFailure> {
    let mut keys = Vec::new();
    if temp_build {
        keys.push(StoreKey::group(package_type.clone(), TEMPORARY_BUILDS_GROUP));
    }
    keys.push(StoreKey::group(package_type.clone(), UNTESTED_BUILDS_GROUP));
    keys.push(StoreKey::hosted(package_type.clone(), SHARED_IMPORTS_ID));
    keys.push(StoreKey::group(package_type.clone(), PUBLIC_GROUP_ID));

    if build_type == BuildType::Gradle {
        let plugins = GRADLE_PLUGINS_REPO.parse::<StoreKey>().map_err(|e| {
            SetupFailure::InvalidRepository {
                url: GRADLE_PLUGINS_REPO.to_string(),
                reason: e.to_string(),
            }
        })?;
        keys.push(plugins);
    }
    Ok(keys)
}

/// `i-` followed by host and path, every non-alphanumeric run collapsed
/// to a single `-`.
fn extra_repository_name(url: &str) -> Result<String, SetupFailure> {
    let parsed = url::Url::parse(url).map_err(|e| SetupFailure::InvalidRepository {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| SetupFailure::InvalidRepository {
        url: url.to_string(),
        reason: "no host".to_string(),
    })?;

    let mut name = String::from(EXTRA_REPO_PREFIX);
    let mut dash = false;
    for c in format!("{}{}", host, parsed.path()).chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash {
            name.push('-');
            dash = true;
        }
    }
    Ok(name.trim_end_matches('-').to_string())
}
