//! Classified artifact records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::PackageType;

/// Repository identifier reported for Maven artifacts
pub const INDY_MAVEN: &str = "indy-maven";
/// Repository identifier reported for NPM artifacts
pub const INDY_NPM: &str = "indy-npm";
/// Repository identifier reported for generic HTTP artifacts
pub const INDY_HTTP: &str = "indy-http";

/// Repository type of an artifact's target repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepositoryType {
    Maven,
    Npm,
    CocoaPod,
    GenericProxy,
    DistributionArchive,
}

impl RepositoryType {
    /// Repository type for a repository manager package type, if one exists.
    pub fn of(package_type: &PackageType) -> Option<Self> {
        match package_type {
            PackageType::Maven => Some(RepositoryType::Maven),
            PackageType::Npm => Some(RepositoryType::Npm),
            PackageType::GenericHttp => Some(RepositoryType::GenericProxy),
            PackageType::Other(_) => None,
        }
    }

    /// Package type holding this repository type's content, if the
    /// repository manager has one.
    pub fn package_type(&self) -> Option<PackageType> {
        match self {
            RepositoryType::Maven => Some(PackageType::Maven),
            RepositoryType::Npm => Some(PackageType::Npm),
            RepositoryType::GenericProxy => Some(PackageType::GenericHttp),
            RepositoryType::CocoaPod | RepositoryType::DistributionArchive => None,
        }
    }
}

/// Build tool of a build; selects the ecosystem of its stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildType {
    Mvn,
    Gradle,
    Sbt,
    Npm,
}

impl BuildType {
    pub fn repository_type(&self) -> RepositoryType {
        match self {
            BuildType::Mvn | BuildType::Gradle | BuildType::Sbt => RepositoryType::Maven,
            BuildType::Npm => RepositoryType::Npm,
        }
    }

    pub fn package_type(&self) -> PackageType {
        match self {
            BuildType::Mvn | BuildType::Gradle | BuildType::Sbt => PackageType::Maven,
            BuildType::Npm => PackageType::Npm,
        }
    }
}

/// Category tag attached to uploaded artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildCategory {
    #[default]
    Standard,
    Service,
}

/// Where an artifact lives after promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRepository {
    pub identifier: String,
    pub repository_type: RepositoryType,
    pub repository_path: String,
    pub temporary_repo: bool,
}

/// A downloaded or uploaded artifact, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryArtifact {
    pub identifier: String,

    /// Package URL; absent when one could not be built
    pub purl: Option<String>,

    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub size: Option<u64>,

    pub deploy_path: String,
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_date: Option<DateTime<Utc>>,

    pub target_repository: TargetRepository,

    /// Set on uploads only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_category: Option<BuildCategory>,
}

impl fmt::Display for RepositoryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}{}]",
            self.identifier, self.target_repository.repository_path, self.deploy_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_maps_to_ecosystem() {
        assert_eq!(BuildType::Gradle.package_type(), PackageType::Maven);
        assert_eq!(BuildType::Sbt.repository_type(), RepositoryType::Maven);
        assert_eq!(BuildType::Npm.package_type(), PackageType::Npm);
    }

    #[test]
    fn test_repository_type_of_package_type() {
        assert_eq!(
            RepositoryType::of(&PackageType::GenericHttp),
            Some(RepositoryType::GenericProxy)
        );
        assert_eq!(RepositoryType::of(&PackageType::Other("rpm".into())), None);
        assert_eq!(RepositoryType::DistributionArchive.package_type(), None);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&RepositoryType::GenericProxy).unwrap(),
            "\"GENERIC_PROXY\""
        );
        assert_eq!(serde_json::to_string(&BuildType::Mvn).unwrap(), "\"MVN\"");
        assert_eq!(
            serde_json::from_str::<BuildCategory>("\"SERVICE\"").unwrap(),
            BuildCategory::Service
        );
    }
}
