//! Wire types of the repository manager's store and promotion APIs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::StoreKey;

fn default_true() -> bool {
    true
}

/// Store definition as created, loaded and updated.
///
/// Field names follow the manager's store JSON (`allow_snapshots`,
/// `allow_releases`). Fields the driver does not model are kept in `extra`
/// so a load-modify-update cycle sends them back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStore {
    pub key: StoreKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Upstream URL of a remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Ordered members of a group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constituents: Vec<StoreKey>,

    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub allow_snapshots: bool,

    #[serde(default = "default_true")]
    pub allow_releases: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtifactStore {
    fn new(key: StoreKey) -> Self {
        Self {
            key,
            description: None,
            url: None,
            constituents: Vec::new(),
            readonly: false,
            allow_snapshots: false,
            allow_releases: true,
            extra: Map::new(),
        }
    }

    pub fn hosted(key: StoreKey) -> Self {
        Self::new(key)
    }

    pub fn group(key: StoreKey, constituents: Vec<StoreKey>) -> Self {
        Self {
            constituents,
            ..Self::new(key)
        }
    }

    pub fn remote(key: StoreKey, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(key)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Promote a set of paths from one store to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsPromoteRequest {
    pub source: StoreKey,
    pub target: StoreKey,
    pub paths: Vec<String>,
    #[serde(default)]
    pub purge_source: bool,
}

impl PathsPromoteRequest {
    pub fn new(source: StoreKey, target: StoreKey, paths: Vec<String>) -> Self {
        Self {
            source,
            target,
            paths,
            purge_source: false,
        }
    }
}

impl fmt::Display for PathsPromoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} paths)",
            self.source,
            self.target,
            self.paths.len()
        )
    }
}

/// Outcome of the repository manager's promotion validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default = "default_true")]
    pub valid: bool,

    #[serde(default)]
    pub rule_set: Option<String>,

    /// Failing rule name to its message
    #[serde(default)]
    pub validator_errors: BTreeMap<String, String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            rule_set: None,
            validator_errors: BTreeMap::new(),
        }
    }
}

impl ValidationResult {
    /// Failed validation under the given rule set
    pub fn failed(rule_set: impl Into<String>) -> Self {
        Self {
            valid: false,
            rule_set: Some(rule_set.into()),
            validator_errors: BTreeMap::new(),
        }
    }

    pub fn with_error(mut self, rule: impl Into<String>, message: impl Into<String>) -> Self {
        self.validator_errors.insert(rule.into(), message.into());
        self
    }
}

/// Result of a path promotion; also the handle for rolling it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsPromoteResult {
    pub request: PathsPromoteRequest,

    #[serde(default)]
    pub completed_paths: Vec<String>,

    #[serde(default)]
    pub pending_paths: Vec<String>,

    #[serde(default)]
    pub skipped_paths: Vec<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub validations: Option<ValidationResult>,
}

impl PathsPromoteResult {
    /// Result with every requested path completed
    pub fn completed(request: PathsPromoteRequest) -> Self {
        Self {
            completed_paths: request.paths.clone(),
            request,
            pending_paths: Vec::new(),
            skipped_paths: Vec::new(),
            error: None,
            validations: None,
        }
    }

    /// Result with nothing promoted
    pub fn rejected(
        request: PathsPromoteRequest,
        error: Option<String>,
        validations: Option<ValidationResult>,
    ) -> Self {
        Self {
            pending_paths: request.paths.clone(),
            request,
            completed_paths: Vec::new(),
            skipped_paths: Vec::new(),
            error,
            validations,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
            && self.pending_paths.is_empty()
            && self.validations.as_ref().map_or(true, |v| v.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageType;

    fn request() -> PathsPromoteRequest {
        PathsPromoteRequest::new(
            StoreKey::remote(PackageType::Maven, "central"),
            StoreKey::hosted(PackageType::Maven, "shared-imports"),
            vec!["a/b/1/b-1.jar".to_string()],
        )
    }

    #[test]
    fn test_completed_result_succeeds() {
        assert!(PathsPromoteResult::completed(request()).succeeded());
    }

    #[test]
    fn test_failed_validation_does_not_succeed() {
        let result = PathsPromoteResult::rejected(
            request(),
            None,
            Some(ValidationResult::failed("maven-no-snapshots")),
        );
        assert!(!result.succeeded());
    }

    #[test]
    fn test_promote_result_wire_format() {
        let json = r#"{
            "request": {
                "source": "maven:remote:central",
                "target": "maven:hosted:shared-imports",
                "paths": ["a/b/1/b-1.jar"],
                "purgeSource": false
            },
            "completedPaths": ["a/b/1/b-1.jar"],
            "validations": {"valid": true, "validatorErrors": {}}
        }"#;
        let result: PathsPromoteResult = serde_json::from_str(json).unwrap();
        assert!(result.succeeded());
        assert_eq!(result.request, request());
    }

    #[test]
    fn test_store_defaults_allow_releases() {
        let json = r#"{"key": "maven:hosted:build-1"}"#;
        let store: ArtifactStore = serde_json::from_str(json).unwrap();
        assert!(store.allow_releases);
        assert!(!store.readonly);
    }

    #[test]
    fn test_store_keeps_unmodelled_fields() {
        let json = r#"{
            "key": "maven:hosted:build-1",
            "type": "hosted",
            "packageType": "maven",
            "name": "build-1",
            "storage": "/var/lib/indy/storage/maven-hosted-build-1",
            "authoritative_index": true,
            "disabled": false,
            "allow_snapshots": true,
            "allow_releases": false,
            "metadata": {"changelog": "Creating hosted repository"}
        }"#;
        let mut store: ArtifactStore = serde_json::from_str(json).unwrap();
        assert!(store.allow_snapshots);
        assert!(!store.allow_releases);

        store.readonly = true;
        let value = serde_json::to_value(&store).unwrap();

        assert_eq!(value["readonly"], true);
        assert_eq!(value["storage"], "/var/lib/indy/storage/maven-hosted-build-1");
        assert_eq!(value["authoritative_index"], true);
        assert_eq!(value["disabled"], false);
        assert_eq!(value["allow_snapshots"], true);
        assert_eq!(value["allow_releases"], false);
        assert_eq!(value["metadata"]["changelog"], "Creating hosted repository");
        assert!(value.get("allowSnapshots").is_none());
    }
}
