//! Per-ecosystem rules
//!
//! Maven, NPM and generic HTTP content differ in four places: identifier,
//! package URL, download target and upload target. Each rule is one match
//! over [`Ecosystem`].

use crate::config::PromotionTargets;
use crate::filter::ArtifactFilter;
use crate::model::{
    PackageType, RepositoryType, StoreKey, TargetRepository, TrackedContentEntry, INDY_HTTP,
    INDY_MAVEN, INDY_NPM, SHARED_IMPORTS_ID,
};
use crate::repo::RepositoryManager;

use super::maven::ArtifactPathInfo;
use super::npm::NpmPackagePathInfo;
use super::purl::{MalformedPurl, PackageUrl, PackageUrlBuilder};

/// Checksum file suffixes; such files never get sidecars of their own
pub const CHECKSUM_SUFFIXES: [&str; 4] = ["md5", "sha1", "sha256", "sha512"];

/// Package ecosystems the driver can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Maven,
    Npm,
    Generic,
}

impl Ecosystem {
    pub fn of(package_type: &PackageType) -> Option<Self> {
        match package_type {
            PackageType::Maven => Some(Ecosystem::Maven),
            PackageType::Npm => Some(Ecosystem::Npm),
            PackageType::GenericHttp => Some(Ecosystem::Generic),
            PackageType::Other(_) => None,
        }
    }

    pub fn package_type(self) -> PackageType {
        match self {
            Ecosystem::Maven => PackageType::Maven,
            Ecosystem::Npm => PackageType::Npm,
            Ecosystem::Generic => PackageType::GenericHttp,
        }
    }

    pub fn repository_type(self) -> RepositoryType {
        match self {
            Ecosystem::Maven => RepositoryType::Maven,
            Ecosystem::Npm => RepositoryType::Npm,
            Ecosystem::Generic => RepositoryType::GenericProxy,
        }
    }

    /// Coordinate identifier, when the path follows the ecosystem's layout
    fn coordinates(self, path: &str) -> Option<String> {
        match self {
            Ecosystem::Maven => ArtifactPathInfo::parse(path).map(|info| info.identifier()),
            Ecosystem::Npm => NpmPackagePathInfo::parse(path).map(|info| info.identifier()),
            Ecosystem::Generic => None,
        }
    }

    /// Coordinate package URL, when the path follows the ecosystem's layout
    fn coordinates_purl(self, path: &str) -> Option<Result<PackageUrl, MalformedPurl>> {
        match self {
            Ecosystem::Maven => ArtifactPathInfo::parse(path).map(|info| {
                let artifact_type = if info.artifact_type.is_empty() {
                    "jar".to_string()
                } else {
                    info.artifact_type
                };
                let mut builder = PackageUrlBuilder::new("maven")
                    .namespace(info.group_id)
                    .name(info.artifact_id)
                    .version(info.version)
                    .qualifier("type", Some(artifact_type));
                if let Some(classifier) = info.classifier {
                    builder = builder.qualifier("classifier", Some(classifier));
                }
                builder.build()
            }),
            Ecosystem::Npm => NpmPackagePathInfo::parse(path).map(|info| {
                let mut builder = PackageUrlBuilder::new("npm")
                    .name(info.base_name())
                    .version(info.version.to_string());
                if let Some(scope) = info.scope() {
                    builder = builder.namespace(scope);
                }
                builder.build()
            }),
            Ecosystem::Generic => None,
        }
    }

    /// Where a downloaded transfer from `source` is reported to live.
    pub fn download_target(
        self,
        source: &StoreKey,
        filter: &dyn ArtifactFilter,
        repository: &dyn RepositoryManager,
    ) -> TargetRepository {
        let (identifier, store) = match self {
            Ecosystem::Maven | Ecosystem::Npm => {
                let store = if filter.ignore_dependency_source(source) {
                    source.clone()
                } else {
                    self.shared_imports()
                };
                let identifier = if self == Ecosystem::Maven {
                    INDY_MAVEN
                } else {
                    INDY_NPM
                };
                (identifier, store)
            }
            Ecosystem::Generic => (
                INDY_HTTP,
                StoreKey::hosted(PackageType::GenericHttp, generic_hosted_name(source.name())),
            ),
        };

        TargetRepository {
            identifier: identifier.to_string(),
            repository_type: self.repository_type(),
            repository_path: api_path(repository, &store),
            temporary_repo: false,
        }
    }

    /// Where an uploaded transfer is promoted to; `None` when the
    /// ecosystem does not accept build output.
    pub fn upload_target(
        self,
        temp_build: bool,
        targets: &PromotionTargets,
        repository: &dyn RepositoryManager,
    ) -> Option<TargetRepository> {
        let identifier = match self {
            Ecosystem::Maven => INDY_MAVEN,
            Ecosystem::Npm => INDY_NPM,
            Ecosystem::Generic => return None,
        };
        let store = StoreKey::hosted(self.package_type(), targets.for_build(temp_build));

        Some(TargetRepository {
            identifier: identifier.to_string(),
            repository_type: self.repository_type(),
            repository_path: api_path(repository, &store),
            temporary_repo: temp_build,
        })
    }

    /// Shared-imports store of this ecosystem
    pub fn shared_imports(self) -> StoreKey {
        StoreKey::hosted(self.package_type(), SHARED_IMPORTS_ID)
    }

    /// Whether promoted paths carry `.md5` and `.sha1` sidecars
    pub fn adds_checksum_sidecars(self) -> bool {
        self == Ecosystem::Maven
    }
}

fn api_path(repository: &dyn RepositoryManager, store: &StoreKey) -> String {
    let mut path = format!("/api/{}", repository.content_path(store));
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Identifier of a transfer: ecosystem coordinates when the path parses,
/// otherwise `<origin or local URL>|<sha256>`.
pub fn identifier_of(transfer: &TrackedContentEntry) -> String {
    let package_type = transfer.store_key.package_type();
    let coordinates = match Ecosystem::of(package_type) {
        Some(ecosystem) => ecosystem.coordinates(&transfer.path),
        None => {
            tracing::warn!(package_type = %package_type, "Package type is not handled by the driver");
            None
        }
    };
    coordinates.unwrap_or_else(|| {
        generic_identifier(transfer.source_url(), transfer.sha256.as_deref())
    })
}

/// Package URL of a transfer, `None` when it cannot be built.
pub fn purl_of(transfer: &TrackedContentEntry) -> Option<String> {
    let purl = Ecosystem::of(transfer.store_key.package_type())
        .and_then(|ecosystem| ecosystem.coordinates_purl(&transfer.path))
        .unwrap_or_else(|| {
            generic_purl(
                transfer.filename(),
                transfer.source_url(),
                transfer.sha256.as_deref(),
            )
        });

    match purl {
        Ok(purl) => Some(purl.to_string()),
        Err(e) => {
            tracing::error!(path = %transfer.path, error = %e, "Cannot calculate purl");
            None
        }
    }
}

pub fn generic_identifier(url: Option<&str>, sha256: Option<&str>) -> String {
    format!("{}|{}", url.unwrap_or_default(), sha256.unwrap_or_default())
}

pub fn generic_purl(
    filename: &str,
    url: Option<&str>,
    sha256: Option<&str>,
) -> Result<PackageUrl, MalformedPurl> {
    PackageUrlBuilder::new("generic")
        .name(filename)
        .qualifier("download_url", url)
        .qualifier("checksum", sha256.map(|h| format!("sha256:{}", h)))
        .build()
}

/// Hosted store paired with a generic remote: `r-<x>` becomes `h-<x>`.
pub fn generic_hosted_name(remote: &str) -> String {
    match remote.strip_prefix("r-") {
        Some(rest) => format!("h-{}", rest),
        None => {
            tracing::warn!(
                remote,
                "Unexpected generic http remote repo name, using it unchanged for the hosted repo which probably does not exist"
            );
            remote.to_string()
        }
    }
}

/// Whether `path` is itself a checksum file
pub fn is_checksum(path: &str) -> bool {
    path.rsplit_once('.')
        .map_or(false, |(_, suffix)| CHECKSUM_SUFFIXES.contains(&suffix))
}
