//! NPM registry tarball paths: `[@scope/]name/-/name-<semver>.tgz`

use semver::Version;

/// Package reference recovered from an NPM tarball path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmPackagePathInfo {
    /// Full package name, `@scope/name` for scoped packages
    pub name: String,
    pub version: Version,
}

impl NpmPackagePathInfo {
    /// Parse a tarball path; `None` when it is not one.
    pub fn parse(path: &str) -> Option<Self> {
        let (name, file) = path.trim_start_matches('/').split_once("/-/")?;

        let segments: Vec<&str> = name.split('/').collect();
        let base = match segments.as_slice() {
            [base] if !base.starts_with('@') => *base,
            [scope, base] if scope.len() > 1 && scope.starts_with('@') => *base,
            _ => return None,
        };
        if base.is_empty() {
            return None;
        }

        let version = file
            .strip_suffix(".tgz")?
            .strip_prefix(base)?
            .strip_prefix('-')?;
        let version = Version::parse(version).ok()?;

        Some(Self {
            name: name.to_string(),
            version,
        })
    }

    /// Scope including its `@`, if the package is scoped
    pub fn scope(&self) -> Option<&str> {
        self.name.split_once('/').map(|(scope, _)| scope)
    }

    /// Package name without its scope
    pub fn base_name(&self) -> &str {
        self.name
            .split_once('/')
            .map_or(self.name.as_str(), |(_, base)| base)
    }

    /// `name:version`
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}
