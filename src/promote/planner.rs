//! Promotion path planning
//!
//! Downloads accepted for promotion go from their remote store to the
//! ecosystem's shared-imports store. Uploads go from the build's hosted
//! store to the build promotion target. Maven paths bring their `.md5` and
//! `.sha1` sidecars along.

use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier::{generic_hosted_name, is_checksum, Ecosystem};
use crate::config::PromotionTargets;
use crate::filter::ArtifactFilter;
use crate::model::{PackageType, StoreKey, TrackedContent};

use super::paths::PromotionPaths;

/// Plans which paths move where after a build.
#[derive(Clone)]
pub struct PromotionPlanner {
    filter: Arc<dyn ArtifactFilter>,
    targets: PromotionTargets,
}

impl PromotionPlanner {
    pub fn new(filter: Arc<dyn ArtifactFilter>, targets: PromotionTargets) -> Self {
        Self { filter, targets }
    }

    /// Dependencies not yet captured, to be imported into shared-imports.
    pub fn collect_downloads_promotions(&self, report: &TrackedContent) -> PromotionPaths {
        let mut promotions = PromotionPaths::new();
        let mut shared_imports: HashMap<Ecosystem, StoreKey> = HashMap::new();

        for download in report.downloads() {
            if !self.filter.accepts_for_promotion(download, true) {
                continue;
            }
            let source = &download.store_key;
            let path = download.path.as_str();

            match Ecosystem::of(source.package_type()) {
                Some(ecosystem @ (Ecosystem::Maven | Ecosystem::Npm)) => {
                    let target = shared_imports
                        .entry(ecosystem)
                        .or_insert_with(|| ecosystem.shared_imports());
                    add_with_sidecars(&mut promotions, source, target, path, ecosystem);
                }
                Some(Ecosystem::Generic) => {
                    // Generic downloads only resolve their hosted store here;
                    // nothing is added to the promotion set for them.
                    let target =
                        StoreKey::hosted(PackageType::GenericHttp, generic_hosted_name(source.name()));
                    tracing::debug!(source = %source, target = %target, path, "Generic download not promoted");
                }
                None => {}
            }
        }

        promotions
    }

    /// Build output of `build_id`, promoted from the build's hosted store.
    pub fn collect_uploads_promotions(
        &self,
        report: &TrackedContent,
        temp_build: bool,
        package_type: &PackageType,
        build_id: &str,
    ) -> PromotionPaths {
        let mut promotions = PromotionPaths::new();
        let source = StoreKey::hosted(package_type.clone(), build_id);
        let target = StoreKey::hosted(package_type.clone(), self.targets.for_build(temp_build));

        for upload in report.uploads() {
            if !self.filter.accepts_for_promotion(upload, false) {
                continue;
            }
            // sidecars follow the ecosystem the upload was tracked in
            match Ecosystem::of(upload.store_key.package_type()) {
                Some(ecosystem) => {
                    add_with_sidecars(&mut promotions, &source, &target, &upload.path, ecosystem)
                }
                None => promotions.add(&source, &target, upload.path.as_str()),
            }
        }

        promotions
    }
}

fn add_with_sidecars(
    promotions: &mut PromotionPaths,
    source: &StoreKey,
    target: &StoreKey,
    path: &str,
    ecosystem: Ecosystem,
) {
    promotions.add(source, target, path);
    if ecosystem.adds_checksum_sidecars() && !is_checksum(path) {
        promotions.add(source, target, format!("{}.md5", path));
        promotions.add(source, target, format!("{}.sha1", path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::filter::PatternArtifactFilter;
    use crate::model::TrackedContentEntry;

    fn planner() -> PromotionPlanner {
        let filter = PatternArtifactFilter::from_config(&DriverConfig::new("http://indy")).unwrap();
        PromotionPlanner::new(
            Arc::new(filter),
            PromotionTargets::new("pnc-builds", "temporary-builds"),
        )
    }

    fn entry(key: &str, path: &str) -> TrackedContentEntry {
        TrackedContentEntry::new(key.parse().unwrap(), path)
    }

    fn key(s: &str) -> StoreKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_maven_download_adds_sidecars() {
        let report = TrackedContent::new("b1")
            .with_download(entry("maven:remote:central", "org/x/y/1.0/y-1.0.jar"));

        let promotions = planner().collect_downloads_promotions(&report);

        let paths = promotions
            .paths(&key("maven:remote:central"), &key("maven:hosted:shared-imports"))
            .unwrap();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec![
                "org/x/y/1.0/y-1.0.jar",
                "org/x/y/1.0/y-1.0.jar.md5",
                "org/x/y/1.0/y-1.0.jar.sha1"
            ]
        );
    }

    #[test]
    fn test_checksum_download_gets_no_sidecars() {
        let report = TrackedContent::new("b1")
            .with_download(entry("maven:remote:central", "org/x/y/1.0/y-1.0.jar.sha1"));

        let promotions = planner().collect_downloads_promotions(&report);

        let paths = promotions
            .paths(&key("maven:remote:central"), &key("maven:hosted:shared-imports"))
            .unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_npm_download_has_no_sidecars() {
        let report = TrackedContent::new("b1")
            .with_download(entry("npm:remote:npmjs", "left-pad/-/left-pad-1.3.0.tgz"));

        let promotions = planner().collect_downloads_promotions(&report);

        let paths = promotions
            .paths(&key("npm:remote:npmjs"), &key("npm:hosted:shared-imports"))
            .unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_downloads_coalesce_per_pair() {
        let report = TrackedContent::new("b1")
            .with_download(entry("maven:remote:central", "org/x/y/1.0/y-1.0.pom"))
            .with_download(entry("maven:remote:central", "org/x/y/1.0/y-1.0.jar"))
            .with_download(entry("maven:remote:central", "org/x/y/1.0/y-1.0.jar"));

        let promotions = planner().collect_downloads_promotions(&report);

        assert_eq!(promotions.len(), 1);
        assert_eq!(promotions.requests()[0].paths.len(), 6);
    }

    #[test]
    fn test_generic_and_hosted_downloads_not_promoted() {
        let report = TrackedContent::new("b1")
            .with_download(entry("generic-http:remote:r-site", "files/tool.zip"))
            .with_download(entry("maven:hosted:shared-imports", "org/x/y/1.0/y-1.0.jar"));

        assert!(planner().collect_downloads_promotions(&report).is_empty());
    }

    #[test]
    fn test_uploads_promote_to_build_target() {
        let report = TrackedContent::new("b1")
            .with_upload(entry("maven:hosted:b1", "org/x/y/1.0/y-1.0.jar"))
            .with_upload(entry("maven:hosted:b1", "org/x/y/1.0/y-1.0.jar.md5"))
            .with_upload(entry("maven:hosted:b1", "org/x/y/maven-metadata.xml"));

        let promotions =
            planner().collect_uploads_promotions(&report, false, &PackageType::Maven, "b1");

        let paths = promotions
            .paths(&key("maven:hosted:b1"), &key("maven:hosted:pnc-builds"))
            .unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths.contains("org/x/y/1.0/y-1.0.jar.sha1"));
        assert!(!paths.contains("org/x/y/maven-metadata.xml"));
    }

    #[test]
    fn test_temp_build_uploads_target_temporary_store() {
        let report =
            TrackedContent::new("b2").with_upload(entry("npm:hosted:b2", "x/-/x-1.0.0.tgz"));

        let promotions = planner().collect_uploads_promotions(&report, true, &PackageType::Npm, "b2");

        assert!(promotions
            .paths(&key("npm:hosted:b2"), &key("npm:hosted:temporary-builds"))
            .is_some());
    }
}
