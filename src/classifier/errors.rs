//! # Classification Errors
//!
//! Classification is all-or-nothing per report: any of these aborts the
//! whole collection.

use thiserror::Error;

use crate::model::{PackageType, Violation};

/// Result type for artifact classification
pub type ClassificationResult<T> = Result<T, ClassificationError>;

/// An artifact that failed validation, with every violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArtifact {
    pub artifact: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    #[error("Repository type {0} is not supported for downloads")]
    UnsupportedDownloadType(PackageType),

    #[error("Repository type {0} is not supported for uploads")]
    UnsupportedUploadType(PackageType),

    #[error("Repository manager returned invalid artifacts: {}", describe(.0))]
    InvalidArtifacts(Vec<InvalidArtifact>),
}

fn describe(invalid: &[InvalidArtifact]) -> String {
    invalid
        .iter()
        .map(|a| {
            let violations: Vec<String> = a.violations.iter().map(|v| v.to_string()).collect();
            format!("{} ({})", a.artifact, violations.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_artifacts_lists_every_violation() {
        let err = ClassificationError::InvalidArtifacts(vec![
            InvalidArtifact {
                artifact: "a".to_string(),
                violations: vec![
                    Violation::new("size", "must not be null"),
                    Violation::new("filename", "must not be blank"),
                ],
            },
            InvalidArtifact {
                artifact: "b".to_string(),
                violations: vec![Violation::new("md5", "bad")],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Repository manager returned invalid artifacts: \
             a (size: must not be null, filename: must not be blank); b (md5: bad)"
        );
    }
}
