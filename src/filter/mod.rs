//! Artifact filter
//!
//! Decides, per tracked transfer, whether it is reported back to the caller
//! (data) and whether its path is promoted. The two decisions are independent.

use regex::Regex;

use crate::config::{ConfigResult, DriverConfig, EcosystemPatterns};
use crate::model::{PackageType, StoreKey, StoreType, TrackedContentEntry};

/// Acceptance policy for tracked transfers.
pub trait ArtifactFilter: Send + Sync {
    /// Whether the transfer appears in the artifact list returned to the caller.
    fn accepts_for_data(&self, transfer: &TrackedContentEntry) -> bool;

    /// Whether the transfer's path is promoted. `download` selects the
    /// download rules; uploads use the upload rules.
    fn accepts_for_promotion(&self, transfer: &TrackedContentEntry, download: bool) -> bool;

    /// Whether content from this store counts as already captured, so it is
    /// neither imported nor reported against shared-imports.
    fn ignore_dependency_source(&self, key: &StoreKey) -> bool;
}

/// Compiled patterns for one purpose, per ecosystem.
#[derive(Debug, Clone, Default)]
struct PathPatterns {
    maven: Vec<Regex>,
    npm: Vec<Regex>,
    generic: Vec<Regex>,
}

impl PathPatterns {
    fn compile(patterns: &EcosystemPatterns) -> ConfigResult<Self> {
        Ok(Self {
            maven: compile_all(&patterns.maven)?,
            npm: compile_all(&patterns.npm)?,
            generic: compile_all(&patterns.generic)?,
        })
    }

    fn matches(&self, package_type: &PackageType, path: &str) -> bool {
        let patterns = match package_type {
            PackageType::Maven => &self.maven,
            PackageType::Npm => &self.npm,
            PackageType::GenericHttp => &self.generic,
            PackageType::Other(_) => return false,
        };
        patterns.iter().any(|p| p.is_match(path))
    }
}

fn compile_all(patterns: &[String]) -> ConfigResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| crate::config::ConfigError::Pattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Filter driven by the configured path and repository patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternArtifactFilter {
    data: PathPatterns,
    promotion: PathPatterns,
    ignored_repos: Vec<Regex>,
}

impl PatternArtifactFilter {
    /// Filter accepting everything remote, with no ignore patterns
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DriverConfig) -> ConfigResult<Self> {
        Ok(Self {
            data: PathPatterns::compile(&config.ignored_path_patterns.data)?,
            promotion: PathPatterns::compile(&config.ignored_path_patterns.promotion)?,
            ignored_repos: compile_all(&config.ignored_repo_patterns)?,
        })
    }
}

impl ArtifactFilter for PatternArtifactFilter {
    fn accepts_for_data(&self, transfer: &TrackedContentEntry) -> bool {
        !self
            .data
            .matches(transfer.store_key.package_type(), &transfer.path)
    }

    fn accepts_for_promotion(&self, transfer: &TrackedContentEntry, download: bool) -> bool {
        let key = &transfer.store_key;
        if download
            && (key.store_type() != StoreType::Remote || self.ignore_dependency_source(key))
        {
            // hosted content is already stored; groups never own content
            return false;
        }
        !self.promotion.matches(key.package_type(), &transfer.path)
    }

    fn ignore_dependency_source(&self, key: &StoreKey) -> bool {
        let key = key.to_string();
        self.ignored_repos.iter().any(|p| p.is_match(&key))
    }
}
