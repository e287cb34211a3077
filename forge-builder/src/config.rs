//! Builder configuration
//!
//! Defines all configurable parameters for the builder including the agents
//! directory layout, the artifact API endpoint, and build execution limits.

use std::path::PathBuf;
use std::time::Duration;

/// Default artifact API endpoint
pub const DEFAULT_API_URL: &str = "http://api:5000/api/v1/payload";

/// Default `Source` label on error reports
pub const DEFAULT_ERROR_SOURCE: &str = "Payload Build Server";

/// Builder configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one working directory per agent type
    pub agents_path: PathBuf,

    /// JSON catalog of agent types, formats, transport types and transports
    pub catalog_path: PathBuf,

    /// Base URL of the payload artifact API
    pub api_url: String,

    /// `Source` label attached to every error report
    pub error_source: String,

    /// Language id recorded on every payload
    pub language_id: i64,

    /// Maximum time a single build command may run; `None` waits forever
    pub build_timeout: Option<Duration>,

    /// Max builds running at the same time
    pub max_parallel_builds: usize,

    /// Shell used to run build command lines
    pub shell: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(agents_path: impl Into<PathBuf>) -> Self {
        let agents_path = agents_path.into();
        Self {
            catalog_path: agents_path.join("catalog.json"),
            agents_path,
            api_url: DEFAULT_API_URL.to_string(),
            error_source: DEFAULT_ERROR_SOURCE.to_string(),
            language_id: 1,
            build_timeout: None,
            max_parallel_builds: 2,
            shell: PathBuf::from("/bin/bash"),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AGENTS_PATH (required)
    /// - CATALOG_PATH (optional, default: $AGENTS_PATH/catalog.json)
    /// - API_URL (optional, default: http://api:5000/api/v1/payload)
    /// - ERROR_SOURCE (optional, default: "Payload Build Server")
    /// - LANGUAGE_ID (optional, default: 1)
    /// - BUILD_TIMEOUT_SECS (optional, 0 or unset = no timeout)
    /// - MAX_PARALLEL_BUILDS (optional, default: 2)
    /// - SHELL_PATH (optional, default: /bin/bash)
    pub fn from_env() -> anyhow::Result<Self> {
        let agents_path = std::env::var("AGENTS_PATH")
            .map_err(|_| anyhow::anyhow!("AGENTS_PATH environment variable not set"))?;

        let mut config = Self::new(agents_path);

        if let Ok(catalog_path) = std::env::var("CATALOG_PATH") {
            config.catalog_path = PathBuf::from(catalog_path);
        }

        if let Ok(api_url) = std::env::var("API_URL") {
            config.api_url = api_url;
        }

        if let Ok(error_source) = std::env::var("ERROR_SOURCE") {
            config.error_source = error_source;
        }

        if let Some(language_id) = std::env::var("LANGUAGE_ID")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
        {
            config.language_id = language_id;
        }

        config.build_timeout = std::env::var("BUILD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        if let Some(max_parallel_builds) = std::env::var("MAX_PARALLEL_BUILDS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.max_parallel_builds = max_parallel_builds;
        }

        if let Ok(shell) = std::env::var("SHELL_PATH") {
            config.shell = PathBuf::from(shell);
        }

        Ok(config)
    }

    /// Sets the build command timeout
    #[allow(dead_code)]
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = Some(timeout);
        self
    }

    /// Directory the finished artifacts are moved into
    pub fn build_output_dir(&self) -> PathBuf {
        self.agents_path.join("build")
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agents_path.as_os_str().is_empty() {
            anyhow::bail!("agents_path cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.error_source.trim().is_empty() {
            anyhow::bail!("error_source cannot be empty");
        }

        if self.max_parallel_builds == 0 {
            anyhow::bail!("max_parallel_builds must be greater than 0");
        }

        if self.shell.as_os_str().is_empty() {
            anyhow::bail!("shell cannot be empty");
        }

        Ok(())
    }
}
