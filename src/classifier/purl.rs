//! Package URLs: `pkg:<type>/<namespace>/<name>@<version>?<qualifiers>`

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A package URL that cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed package URL: {0}")]
pub struct MalformedPurl(pub String);

#[derive(Debug, Clone, Default)]
pub struct PackageUrlBuilder {
    package_type: String,
    namespace: Option<String>,
    name: Option<String>,
    version: Option<String>,
    qualifiers: BTreeMap<String, Option<String>>,
}

impl PackageUrlBuilder {
    pub fn new(package_type: impl Into<String>) -> Self {
        Self {
            package_type: package_type.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// A `None` value fails the build.
    pub fn qualifier(mut self, key: &str, value: Option<impl Into<String>>) -> Self {
        self.qualifiers
            .insert(key.to_string(), value.map(Into::into));
        self
    }

    pub fn build(self) -> Result<PackageUrl, MalformedPurl> {
        if self.package_type.is_empty()
            || !self
                .package_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
        {
            return Err(MalformedPurl(format!(
                "invalid type '{}'",
                self.package_type
            )));
        }

        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(MalformedPurl("name is required".to_string())),
        };

        let mut qualifiers = BTreeMap::new();
        for (key, value) in self.qualifiers {
            match value {
                Some(value) if !value.is_empty() => {
                    qualifiers.insert(key.to_lowercase(), value);
                }
                _ => {
                    return Err(MalformedPurl(format!(
                        "qualifier '{}' has no value",
                        key
                    )))
                }
            }
        }

        Ok(PackageUrl {
            package_type: self.package_type.to_lowercase(),
            namespace: self.namespace.filter(|n| !n.is_empty()),
            name,
            version: self.version.filter(|v| !v.is_empty()),
            qualifiers,
        })
    }
}

/// A validated package URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUrl {
    package_type: String,
    namespace: Option<String>,
    name: String,
    version: Option<String>,
    qualifiers: BTreeMap<String, String>,
}

impl fmt::Display for PackageUrl {
    /// Canonical form: components percent-encoded, qualifiers sorted by key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.package_type)?;
        if let Some(namespace) = &self.namespace {
            for segment in namespace.split('/').filter(|s| !s.is_empty()) {
                write!(f, "{}/", urlencoding::encode(segment))?;
            }
        }
        write!(f, "{}", urlencoding::encode(&self.name))?;
        if let Some(version) = &self.version {
            write!(f, "@{}", urlencoding::encode(version))?;
        }
        let mut separator = '?';
        for (key, value) in &self.qualifiers {
            write!(f, "{}{}={}", separator, key, urlencoding::encode(value))?;
            separator = '&';
        }
        Ok(())
    }
}
