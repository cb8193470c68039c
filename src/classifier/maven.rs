//! Maven repository layout
//!
//! `<group path>/<artifactId>/<version>/<artifactId>-<version>[-<classifier>].<type>`,
//! where a `-SNAPSHOT` directory may hold files stamped
//! `<base>-<yyyyMMdd.HHmmss>-<build number>`.

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Coordinates recovered from a Maven repository path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPathInfo {
    pub group_id: String,
    pub artifact_id: String,
    /// Version as it appears in the file name
    pub version: String,
    pub classifier: Option<String>,
    /// Everything after the first dot following version and classifier,
    /// e.g. `jar`, `tar.gz`, `jar.sha1`
    pub artifact_type: String,
}

impl ArtifactPathInfo {
    /// Parse a repository path; `None` when it does not follow the layout.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let (filename, rest) = segments.split_last()?;
        let (dir_version, rest) = rest.split_last()?;
        let (artifact_id, group) = rest.split_last()?;

        let tail = filename.strip_prefix(artifact_id)?.strip_prefix('-')?;
        let (version, tail) = match_version(dir_version, tail)?;

        let (classifier, artifact_type) = match tail.strip_prefix('-') {
            Some(rest) => {
                let (classifier, artifact_type) = rest.split_once('.')?;
                (Some(classifier), artifact_type)
            }
            None => (None, tail.strip_prefix('.')?),
        };
        if classifier.map_or(false, str::is_empty) || artifact_type.is_empty() {
            return None;
        }

        Some(Self {
            group_id: group.join("."),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier: classifier.map(str::to_string),
            artifact_type: artifact_type.to_string(),
        })
    }

    /// `group:artifact:type:version[:classifier]`
    pub fn identifier(&self) -> String {
        let mut id = format!(
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.artifact_type, self.version
        );
        if let Some(classifier) = &self.classifier {
            id.push(':');
            id.push_str(classifier);
        }
        id
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX) || timestamp_len(&self.version).is_some()
    }
}

/// Split `tail` into the file version and what follows it. The file
/// version is either the directory version or, for snapshots, the
/// timestamped form of it.
fn match_version<'a>(dir_version: &str, tail: &'a str) -> Option<(&'a str, &'a str)> {
    if let Some(rest) = tail.strip_prefix(dir_version) {
        if rest.is_empty() || rest.starts_with('.') || rest.starts_with('-') {
            return Some(tail.split_at(dir_version.len()));
        }
    }

    let base = dir_version.strip_suffix(SNAPSHOT_SUFFIX)?;
    let stamp = tail.strip_prefix(base)?.strip_prefix('-')?;
    let len = base.len() + 1 + timestamp_prefix_len(stamp)?;
    Some(tail.split_at(len))
}

/// Length of a leading `yyyyMMdd.HHmmss-N` snapshot stamp.
fn timestamp_prefix_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let digits = |range: std::ops::Range<usize>| {
        bytes.get(range).map_or(false, |b| b.iter().all(u8::is_ascii_digit))
    };
    if !(digits(0..8) && bytes.get(8) == Some(&b'.') && digits(9..15) && bytes.get(15) == Some(&b'-'))
    {
        return None;
    }
    let build = bytes[16..].iter().take_while(|b| b.is_ascii_digit()).count();
    (build > 0).then_some(16 + build)
}

/// Length of the stamp when `version` ends with one.
fn timestamp_len(version: &str) -> Option<usize> {
    let (_, stamp) = version.split_once('-')?;
    timestamp_prefix_len(stamp).filter(|len| *len == stamp.len())
}
