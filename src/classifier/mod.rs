//! Artifact classifier
//!
//! Turns a sealed tracking report into the artifact records returned to
//! the caller: downloads become dependencies, uploads become built
//! artifacts. Every record is validated; one invalid record fails the
//! whole collection.

mod ecosystem;
mod errors;
pub mod maven;
pub mod npm;
pub mod purl;

pub use ecosystem::{
    generic_hosted_name, identifier_of, is_checksum, purl_of, Ecosystem, CHECKSUM_SUFFIXES,
};
pub use errors::{ClassificationError, ClassificationResult, InvalidArtifact};

use std::sync::Arc;

use chrono::Utc;

use crate::config::PromotionTargets;
use crate::filter::ArtifactFilter;
use crate::model::{
    ArtifactValidator, BuildCategory, RepositoryArtifact, TrackedContent, TrackedContentEntry,
};
use crate::repo::RepositoryManager;

/// Classifies tracked transfers into artifact records.
#[derive(Clone)]
pub struct ArtifactClassifier {
    filter: Arc<dyn ArtifactFilter>,
    validator: Arc<dyn ArtifactValidator>,
    repository: Arc<dyn RepositoryManager>,
    targets: PromotionTargets,
}

impl ArtifactClassifier {
    pub fn new(
        filter: Arc<dyn ArtifactFilter>,
        validator: Arc<dyn ArtifactValidator>,
        repository: Arc<dyn RepositoryManager>,
        targets: PromotionTargets,
    ) -> Self {
        Self {
            filter,
            validator,
            repository,
            targets,
        }
    }

    /// Dependencies of a build, sorted by identifier.
    pub fn collect_downloaded_artifacts(
        &self,
        report: &TrackedContent,
    ) -> ClassificationResult<Vec<RepositoryArtifact>> {
        let mut validated = Validated::default();

        for download in report.downloads() {
            if !self.filter.accepts_for_data(download) {
                continue;
            }
            let package_type = download.store_key.package_type();
            let ecosystem = Ecosystem::of(package_type)
                .ok_or_else(|| ClassificationError::UnsupportedDownloadType(package_type.clone()))?;

            let identifier = identifier_of(download);
            tracing::info!("Recording download: {}", identifier);

            let target_repository = ecosystem.download_target(
                &download.store_key,
                self.filter.as_ref(),
                self.repository.as_ref(),
            );
            let artifact = RepositoryArtifact {
                origin_url: download.source_url().map(str::to_string),
                import_date: Some(Utc::now()),
                ..record(download, identifier, target_repository)
            };
            validated.push(self.validator.as_ref(), artifact);
        }

        let mut artifacts = validated.finish()?;
        artifacts.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(artifacts)
    }

    /// Build output, in report order, tagged with `build_category`.
    pub fn collect_uploaded_artifacts(
        &self,
        report: &TrackedContent,
        temp_build: bool,
        build_category: BuildCategory,
    ) -> ClassificationResult<Vec<RepositoryArtifact>> {
        let mut validated = Validated::default();

        for upload in report.uploads() {
            if !self.filter.accepts_for_data(upload) {
                continue;
            }
            let package_type = upload.store_key.package_type();
            let unsupported = || ClassificationError::UnsupportedUploadType(package_type.clone());
            let target_repository = Ecosystem::of(package_type)
                .and_then(|ecosystem| {
                    ecosystem.upload_target(temp_build, &self.targets, self.repository.as_ref())
                })
                .ok_or_else(unsupported)?;

            let identifier = identifier_of(upload);
            tracing::info!("Recording upload: {}", identifier);

            let artifact = RepositoryArtifact {
                build_category: Some(build_category),
                ..record(upload, identifier, target_repository)
            };
            validated.push(self.validator.as_ref(), artifact);
        }

        validated.finish()
    }

    pub fn filter(&self) -> &dyn ArtifactFilter {
        self.filter.as_ref()
    }

    pub fn targets(&self) -> &PromotionTargets {
        &self.targets
    }
}

fn record(
    transfer: &TrackedContentEntry,
    identifier: String,
    target_repository: crate::model::TargetRepository,
) -> RepositoryArtifact {
    RepositoryArtifact {
        purl: purl_of(transfer),
        identifier,
        md5: transfer.md5.clone(),
        sha1: transfer.sha1.clone(),
        sha256: transfer.sha256.clone(),
        size: transfer.size,
        deploy_path: transfer.path.clone(),
        filename: transfer.filename().to_string(),
        origin_url: None,
        import_date: None,
        target_repository,
        build_category: None,
    }
}

/// Accumulates artifacts, keeping every violation found.
#[derive(Default)]
struct Validated {
    artifacts: Vec<RepositoryArtifact>,
    invalid: Vec<InvalidArtifact>,
}

impl Validated {
    fn push(&mut self, validator: &dyn ArtifactValidator, artifact: RepositoryArtifact) {
        let violations = validator.validate(&artifact);
        if violations.is_empty() {
            self.artifacts.push(artifact);
        } else {
            self.invalid.push(InvalidArtifact {
                artifact: artifact.to_string(),
                violations,
            });
        }
    }

    fn finish(self) -> ClassificationResult<Vec<RepositoryArtifact>> {
        if self.invalid.is_empty() {
            Ok(self.artifacts)
        } else {
            Err(ClassificationError::InvalidArtifacts(self.invalid))
        }
    }
}
