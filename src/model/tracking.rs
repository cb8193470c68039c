//! Content tracking report
//!
//! The repository manager records every path a build downloaded or uploaded
//! through its per-build stores. Once sealed, the report is immutable.

use serde::{Deserialize, Serialize};

use super::store::StoreKey;

/// One tracked download or upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedContentEntry {
    /// Store the content was read from or written to
    pub store_key: StoreKey,

    pub path: String,

    /// Upstream URL, absent for content served from hosted stores
    #[serde(default)]
    pub origin_url: Option<String>,

    /// URL of the copy inside the repository manager
    #[serde(default)]
    pub local_url: Option<String>,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub md5: Option<String>,

    #[serde(default)]
    pub sha1: Option<String>,

    #[serde(default)]
    pub sha256: Option<String>,
}

impl TrackedContentEntry {
    pub fn new(store_key: StoreKey, path: impl Into<String>) -> Self {
        Self {
            store_key,
            path: path.into(),
            origin_url: None,
            local_url: None,
            size: None,
            md5: None,
            sha1: None,
            sha256: None,
        }
    }

    pub fn with_origin_url(mut self, url: impl Into<String>) -> Self {
        self.origin_url = Some(url.into());
        self
    }

    pub fn with_local_url(mut self, url: impl Into<String>) -> Self {
        self.local_url = Some(url.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Last path segment
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Origin URL when known, otherwise the local mirror URL.
    pub fn source_url(&self) -> Option<&str> {
        self.origin_url.as_deref().or(self.local_url.as_deref())
    }
}

/// Key of a tracking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingKey {
    pub id: String,
}

/// Sealed tracking report of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedContent {
    pub key: TrackingKey,

    #[serde(default)]
    pub uploads: Option<Vec<TrackedContentEntry>>,

    #[serde(default)]
    pub downloads: Option<Vec<TrackedContentEntry>>,
}

impl TrackedContent {
    /// Create an empty report for a build
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            key: TrackingKey { id: build_id.into() },
            uploads: None,
            downloads: None,
        }
    }

    pub fn with_download(mut self, entry: TrackedContentEntry) -> Self {
        self.downloads.get_or_insert_with(Vec::new).push(entry);
        self
    }

    pub fn with_upload(mut self, entry: TrackedContentEntry) -> Self {
        self.uploads.get_or_insert_with(Vec::new).push(entry);
        self
    }

    pub fn downloads(&self) -> &[TrackedContentEntry] {
        self.downloads.as_deref().unwrap_or(&[])
    }

    pub fn uploads(&self) -> &[TrackedContentEntry] {
        self.uploads.as_deref().unwrap_or(&[])
    }
}
