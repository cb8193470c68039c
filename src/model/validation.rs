//! Structural validation of classified artifacts

use std::fmt;

use serde::Serialize;

use super::artifact::RepositoryArtifact;

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validates artifacts before they are handed back to the caller.
pub trait ArtifactValidator: Send + Sync {
    /// Returns every violated constraint; empty when the artifact is valid.
    fn validate(&self, artifact: &RepositoryArtifact) -> Vec<Violation>;
}

/// Required fields and well-formed checksums.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultArtifactValidator;

impl ArtifactValidator for DefaultArtifactValidator {
    fn validate(&self, artifact: &RepositoryArtifact) -> Vec<Violation> {
        let mut violations = Vec::new();

        require_text(&mut violations, "identifier", &artifact.identifier);
        require_text(&mut violations, "deployPath", &artifact.deploy_path);
        require_text(&mut violations, "filename", &artifact.filename);
        require_text(
            &mut violations,
            "targetRepository.identifier",
            &artifact.target_repository.identifier,
        );
        require_text(
            &mut violations,
            "targetRepository.repositoryPath",
            &artifact.target_repository.repository_path,
        );

        if artifact.size.is_none() {
            violations.push(Violation::new("size", "must not be null"));
        }

        let checksums = [
            ("md5", artifact.md5.as_deref(), 32),
            ("sha1", artifact.sha1.as_deref(), 40),
            ("sha256", artifact.sha256.as_deref(), 64),
        ];
        if checksums.iter().all(|(_, value, _)| value.is_none()) {
            violations.push(Violation::new("checksums", "at least one checksum is required"));
        }
        for (field, value, len) in checksums {
            if let Some(value) = value {
                if !is_hex_of_len(value, len) {
                    violations.push(Violation::new(
                        field,
                        format!("must be {} hexadecimal characters, got '{}'", len, value),
                    ));
                }
            }
        }

        violations
    }
}

fn require_text(violations: &mut Vec<Violation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "must not be blank"));
    }
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_hexdigit())
}
