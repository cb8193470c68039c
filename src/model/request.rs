//! Request and response types of the driver's public operations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::{BuildCategory, BuildType, RepositoryArtifact};

/// HTTP method of a callback or heartbeat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Caller-supplied HTTP endpoint for callbacks and heartbeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: HttpMethod,
    pub uri: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

impl Request {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Input of `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub build_content_id: String,
    pub build_type: BuildType,
    #[serde(default)]
    pub temp_build: bool,
    /// Extra remote repository URLs consulted after the builtin sources
    #[serde(default)]
    pub extra_repositories: Vec<String>,
}

/// Output of `create`: tracking URLs the build reads and deploys through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub repository_dependency_url: String,
    pub repository_deploy_url: String,
}

/// Input of `promote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub build_content_id: String,
    pub build_type: BuildType,
    #[serde(default)]
    pub temp_build: bool,
    #[serde(default)]
    pub build_category: BuildCategory,
    pub callback: Request,
    #[serde(default)]
    pub heart_beat: Option<Request>,
}

/// Input of the inspect-only collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    pub build_content_id: String,
    #[serde(default)]
    pub temp_build: bool,
    #[serde(default)]
    pub build_category: BuildCategory,
}

/// Terminal status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    /// The repository manager rejected the promotion
    Failed,
    /// Infrastructure or classification failure
    SystemError,
}

/// Terminal result of a promotion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResult {
    pub built_artifacts: Vec<RepositoryArtifact>,
    pub dependencies: Vec<RepositoryArtifact>,
    pub build_content_id: String,
    pub message: String,
    pub status: Status,
}

impl PromoteResult {
    pub fn success(
        build_content_id: impl Into<String>,
        built_artifacts: Vec<RepositoryArtifact>,
        dependencies: Vec<RepositoryArtifact>,
    ) -> Self {
        Self {
            built_artifacts,
            dependencies,
            build_content_id: build_content_id.into(),
            message: String::new(),
            status: Status::Success,
        }
    }

    pub fn failed(
        build_content_id: impl Into<String>,
        message: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            built_artifacts: Vec::new(),
            dependencies: Vec::new(),
            build_content_id: build_content_id.into(),
            message: message.into(),
            status,
        }
    }
}
