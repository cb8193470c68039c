//! Driver configuration
//!
//! Loaded from a JSON file. Every field has a default except the repository
//! manager URL; the whole configuration is validated before use.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub repository_manager: RepositoryManagerConfig,

    /// Per-request timeout for callback and heartbeat calls
    #[serde(default = "default_http_client_request_timeout")]
    pub http_client_request_timeout_secs: u64,

    /// Total time budget for delivering one callback
    #[serde(default = "default_callback_retry_duration")]
    pub callback_retry_duration_secs: u64,

    #[serde(default = "default_callback_retry_initial_delay")]
    pub callback_retry_initial_delay_ms: u64,

    #[serde(default = "default_callback_retry_max_delay")]
    pub callback_retry_max_delay_ms: u64,

    /// Hosted store receiving outputs of permanent builds
    #[serde(default = "default_build_promotion_target")]
    pub build_promotion_target: String,

    /// Hosted store receiving outputs of temporary builds
    #[serde(default = "default_temp_build_promotion_target")]
    pub temp_build_promotion_target: String,

    /// How long shutdown waits for running promotions
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    #[serde(default)]
    pub ignored_path_patterns: IgnoredPathPatterns,

    /// Patterns over `pkg:type:name` keys of stores whose content is
    /// already captured and must not be imported
    #[serde(default)]
    pub ignored_repo_patterns: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_http_client_request_timeout() -> u64 {
    15
}
fn default_callback_retry_duration() -> u64 {
    600
}
fn default_callback_retry_initial_delay() -> u64 {
    500
}
fn default_callback_retry_max_delay() -> u64 {
    5000
}
fn default_build_promotion_target() -> String {
    "pnc-builds".to_string()
}
fn default_temp_build_promotion_target() -> String {
    "temporary-builds".to_string()
}
fn default_shutdown_timeout() -> u64 {
    60
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection to the repository manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryManagerConfig {
    /// Base URL, e.g. `http://indy.example.com`
    pub url: String,

    #[serde(default)]
    pub auth_token: Option<String>,

    /// Promotions of large builds can take minutes
    #[serde(default = "default_repository_manager_timeout")]
    pub request_timeout_secs: u64,
}

fn default_repository_manager_timeout() -> u64 {
    600
}

impl RepositoryManagerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            request_timeout_secs: default_repository_manager_timeout(),
        }
    }
}

/// Path patterns per ecosystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcosystemPatterns {
    #[serde(default)]
    pub maven: Vec<String>,
    #[serde(default)]
    pub npm: Vec<String>,
    #[serde(default)]
    pub generic: Vec<String>,
}

impl EcosystemPatterns {
    fn all(&self) -> impl Iterator<Item = &String> {
        self.maven.iter().chain(&self.npm).chain(&self.generic)
    }
}

/// Paths excluded from the artifact list and from promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoredPathPatterns {
    #[serde(default)]
    pub data: EcosystemPatterns,
    #[serde(default = "default_promotion_ignores")]
    pub promotion: EcosystemPatterns,
}

fn default_promotion_ignores() -> EcosystemPatterns {
    EcosystemPatterns {
        maven: vec![r"maven-metadata\.xml$".to_string()],
        npm: vec![r"package\.json$".to_string()],
        generic: Vec::new(),
    }
}

impl Default for IgnoredPathPatterns {
    fn default() -> Self {
        Self {
            data: EcosystemPatterns::default(),
            promotion: default_promotion_ignores(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One JSON object per line instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// Names of the stores receiving build outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionTargets {
    pub build: String,
    pub temp_build: String,
}

impl PromotionTargets {
    pub fn new(build: impl Into<String>, temp_build: impl Into<String>) -> Self {
        Self {
            build: build.into(),
            temp_build: temp_build.into(),
        }
    }

    /// Target store name for a temporary or permanent build
    pub fn for_build(&self, temp_build: bool) -> &str {
        if temp_build {
            &self.temp_build
        } else {
            &self.build
        }
    }
}

impl DriverConfig {
    /// Configuration with defaults for everything but the repository manager
    pub fn new(repository_manager_url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            repository_manager: RepositoryManagerConfig::new(repository_manager_url),
            http_client_request_timeout_secs: default_http_client_request_timeout(),
            callback_retry_duration_secs: default_callback_retry_duration(),
            callback_retry_initial_delay_ms: default_callback_retry_initial_delay(),
            callback_retry_max_delay_ms: default_callback_retry_max_delay(),
            build_promotion_target: default_build_promotion_target(),
            temp_build_promotion_target: default_temp_build_promotion_target(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            ignored_path_patterns: IgnoredPathPatterns::default(),
            ignored_repo_patterns: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: DriverConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate field values and compile every pattern once.
    pub fn validate(&self) -> ConfigResult<()> {
        url::Url::parse(&self.repository_manager.url).map_err(|e| {
            ConfigError::invalid(
                "repository_manager.url",
                format!("'{}' is not a URL: {}", self.repository_manager.url, e),
            )
        })?;

        if self.build_promotion_target.trim().is_empty() {
            return Err(ConfigError::invalid("build_promotion_target", "must not be empty"));
        }
        if self.temp_build_promotion_target.trim().is_empty() {
            return Err(ConfigError::invalid(
                "temp_build_promotion_target",
                "must not be empty",
            ));
        }

        for (field, value) in [
            ("http_client_request_timeout_secs", self.http_client_request_timeout_secs),
            ("callback_retry_duration_secs", self.callback_retry_duration_secs),
            ("callback_retry_initial_delay_ms", self.callback_retry_initial_delay_ms),
            ("repository_manager.request_timeout_secs", self.repository_manager.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be > 0"));
            }
        }

        if self.callback_retry_initial_delay_ms > self.callback_retry_max_delay_ms {
            return Err(ConfigError::invalid(
                "callback_retry_max_delay_ms",
                "must not be smaller than callback_retry_initial_delay_ms",
            ));
        }

        let patterns = self
            .ignored_path_patterns
            .data
            .all()
            .chain(self.ignored_path_patterns.promotion.all())
            .chain(&self.ignored_repo_patterns);
        for pattern in patterns {
            regex::Regex::new(pattern).map_err(|e| ConfigError::Pattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn promotion_targets(&self) -> PromotionTargets {
        PromotionTargets::new(&self.build_promotion_target, &self.temp_build_promotion_target)
    }

    pub fn http_client_request_timeout(&self) -> Duration {
        Duration::from_secs(self.http_client_request_timeout_secs)
    }

    pub fn callback_retry_duration(&self) -> Duration {
        Duration::from_secs(self.callback_retry_duration_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
