use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the TBR lookup service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// External source settings
    pub sources: SourcesConfig,

    /// Trope extraction settings
    pub tropes: TropeConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Allow requests from any origin
    pub cors_allow_any: bool,
}

/// Which sources are consulted, and in what order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// Scrape the catalog first, fall back to the metadata API
    #[default]
    CatalogThenApi,
    CatalogOnly,
    /// Metadata API as the sole source; its errors are surfaced
    ApiOnly,
}

impl LookupStrategy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "catalog_then_api" => Ok(Self::CatalogThenApi),
            "catalog_only" => Ok(Self::CatalogOnly),
            "api_only" => Ok(Self::ApiOnly),
            other => Err(anyhow!("Unknown lookup strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub strategy: LookupStrategy,

    /// Timeout for each outbound request (seconds)
    pub request_timeout_seconds: u64,

    /// User agent sent to every source
    pub user_agent: String,

    pub catalog: CatalogConfig,

    pub metadata_api: MetadataApiConfig,

    pub captions: CaptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub search_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataApiConfig {
    pub base_url: String,

    /// Candidates requested per query (1-3)
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Read title/author hints from video captions
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TropeConfig {
    /// Maximum tropes per book (0 = unbounded)
    pub max_tropes: usize,

    /// Replacement vocabulary, one phrase per line
    pub vocabulary_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for this crate
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_allow_any: true,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            strategy: LookupStrategy::CatalogThenApi,
            request_timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            catalog: CatalogConfig::default(),
            metadata_api: MetadataApiConfig::default(),
            captions: CaptionConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goodreads.com".to_string(),
            search_path: "/search".to_string(),
        }
    }
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            max_results: 3,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for TropeConfig {
    fn default() -> Self {
        Self {
            max_tropes: crate::tropes::DEFAULT_MAX_TROPES,
            vocabulary_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// First config file present in the search path, if any
    pub fn discover() -> Option<PathBuf> {
        let config_paths = [
            "tbr-lookup.toml",
            "config/tbr-lookup.toml",
            "/etc/tbr-lookup/config.toml",
        ];

        config_paths
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Load a specific configuration file, then apply environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        config.apply_env()?;
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {}", port))?;
        }

        if let Some(host) = lookup("TBR_HOST") {
            self.server.host = host;
        }

        if let Some(strategy) = lookup("TBR_STRATEGY") {
            self.sources.strategy = LookupStrategy::parse(&strategy)?;
        }

        if let Some(timeout) = lookup("TBR_REQUEST_TIMEOUT") {
            self.sources.request_timeout_seconds = timeout
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid TBR_REQUEST_TIMEOUT value: {}", timeout))?;
        }

        if let Some(level) = lookup("TBR_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be greater than 0"));
        }

        if self.sources.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }

        if !(1..=3).contains(&self.sources.metadata_api.max_results) {
            return Err(anyhow!("metadata_api.max_results must be between 1 and 3"));
        }

        if self.sources.catalog.base_url.trim().is_empty() {
            return Err(anyhow!("catalog.base_url must not be empty"));
        }

        if self.sources.metadata_api.base_url.trim().is_empty() {
            return Err(anyhow!("metadata_api.base_url must not be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Tracing filter directive for this configuration
    pub fn log_filter(&self, verbose: bool) -> String {
        let level = if verbose { "debug" } else { self.logging.level.as_str() };
        format!("tbr_lookup={},tower_http={},warn", level, level)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "TBR Lookup Configuration:\n\
            - Listen: {}:{}\n\
            - Strategy: {:?}\n\
            - Request Timeout: {}s\n\
            - Catalog: {}\n\
            - Metadata API: {} (max {} results)\n\
            - Captions Enabled: {}\n\
            - Max Tropes: {}",
            self.server.host,
            self.server.port,
            self.sources.strategy,
            self.sources.request_timeout_seconds,
            self.sources.catalog.base_url,
            self.sources.metadata_api.base_url,
            self.sources.metadata_api.max_results,
            self.sources.captions.enabled,
            self.tropes.max_tropes
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.config.sources.strategy = strategy;
        self
    }

    pub fn with_catalog_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.sources.catalog.base_url = base_url.into();
        self
    }

    pub fn with_metadata_api_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.sources.metadata_api.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.config.sources.request_timeout_seconds = seconds;
        self
    }

    pub fn with_max_tropes(mut self, max_tropes: usize) -> Self {
        self.config.tropes.max_tropes = max_tropes;
        self
    }

    pub fn enable_captions(mut self, enable: bool) -> Self {
        self.config.sources.captions.enabled = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
