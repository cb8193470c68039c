//! Store keys
//!
//! A store key names one storage unit in the repository manager as
//! `package-type:store-type:name`, for example `maven:hosted:shared-imports`.
//! Per-build stores are always named after the build content id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Package key used by the repository manager for Maven content
pub const MAVEN_PKG_KEY: &str = "maven";
/// Package key used by the repository manager for NPM content
pub const NPM_PKG_KEY: &str = "npm";
/// Package key used by the repository manager for generic HTTP content
pub const GENERIC_PKG_KEY: &str = "generic-http";

/// Hosted store accumulating build dependencies not captured elsewhere
pub const SHARED_IMPORTS_ID: &str = "shared-imports";
/// Group aggregating outputs of permanent builds
pub const UNTESTED_BUILDS_GROUP: &str = "builds-untested";
/// Group aggregating outputs of temporary builds
pub const TEMPORARY_BUILDS_GROUP: &str = "temporary-builds";
/// Group of public upstream remotes
pub const PUBLIC_GROUP_ID: &str = "public";
/// Remote store for Gradle plugins
pub const GRADLE_PLUGINS_REPO: &str = "maven:remote:gradle-plugins";

/// Package ecosystem of a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageType {
    Maven,
    Npm,
    GenericHttp,
    /// A package type this driver has no rules for
    Other(String),
}

impl PackageType {
    /// Key used in store keys and REST paths
    pub fn key(&self) -> &str {
        match self {
            PackageType::Maven => MAVEN_PKG_KEY,
            PackageType::Npm => NPM_PKG_KEY,
            PackageType::GenericHttp => GENERIC_PKG_KEY,
            PackageType::Other(key) => key,
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            MAVEN_PKG_KEY => PackageType::Maven,
            NPM_PKG_KEY => PackageType::Npm,
            GENERIC_PKG_KEY => PackageType::GenericHttp,
            other => PackageType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for PackageType {
    fn from(key: String) -> Self {
        PackageType::from_key(&key)
    }
}

impl From<PackageType> for String {
    fn from(package_type: PackageType) -> Self {
        package_type.key().to_string()
    }
}

/// Kind of store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Physically stores content
    Hosted,
    /// Aggregates other stores for reading
    Group,
    /// Proxies an upstream URL
    Remote,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Hosted => "hosted",
            StoreType::Group => "group",
            StoreType::Remote => "remote",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = InvalidStoreKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hosted" => Ok(StoreType::Hosted),
            "group" => Ok(StoreType::Group),
            "remote" => Ok(StoreType::Remote),
            other => Err(InvalidStoreKey(other.to_string())),
        }
    }
}

/// Store key that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid store key '{0}': expected <package>:<type>:<name>")]
pub struct InvalidStoreKey(pub String);

/// Identifies a store in the repository manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreKey {
    package_type: PackageType,
    store_type: StoreType,
    name: String,
}

impl StoreKey {
    pub fn new(package_type: PackageType, store_type: StoreType, name: impl Into<String>) -> Self {
        Self {
            package_type,
            store_type,
            name: name.into(),
        }
    }

    pub fn hosted(package_type: PackageType, name: impl Into<String>) -> Self {
        Self::new(package_type, StoreType::Hosted, name)
    }

    pub fn group(package_type: PackageType, name: impl Into<String>) -> Self {
        Self::new(package_type, StoreType::Group, name)
    }

    pub fn remote(package_type: PackageType, name: impl Into<String>) -> Self {
        Self::new(package_type, StoreType::Remote, name)
    }

    pub fn package_type(&self) -> &PackageType {
        &self.package_type
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.package_type, self.store_type, self.name)
    }
}

impl FromStr for StoreKey {
    type Err = InvalidStoreKey;

    /// Parses `pkg:type:name`. The legacy two-part form `type:name` is read
    /// as a Maven key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidStoreKey(s.to_string());
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let (package_type, store_type, name) = match parts.as_slice() {
            [pkg, ty, name] => (PackageType::from_key(pkg), *ty, *name),
            [ty, name] => (PackageType::Maven, *ty, *name),
            _ => return Err(invalid()),
        };
        if name.is_empty() || package_type.key().is_empty() {
            return Err(invalid());
        }
        let store_type = store_type.parse().map_err(|_| invalid())?;
        Ok(Self::new(package_type, store_type, name))
    }
}

impl TryFrom<String> for StoreKey {
    type Error = InvalidStoreKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoreKey> for String {
    fn from(key: StoreKey) -> Self {
        key.to_string()
    }
}
