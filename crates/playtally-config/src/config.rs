use playtally_models::{ExportKind, DEFAULT_PAGE_SIZE, DEFAULT_WATCHED_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the Tautulli instance lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default = "default_watched_threshold")]
    pub watched_threshold: f64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub kind: ExportKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_watched_threshold() -> f64 {
    DEFAULT_WATCHED_THRESHOLD
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            user: None,
            watched_threshold: default_watched_threshold(),
            page_size: default_page_size(),
            kind: ExportKind::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Built-in defaults when `path` does not exist yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks a configuration that is about to drive an export: server and
    /// user must be known and every tunable must be in range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.url.as_deref().map_or(true, |url| url.trim().is_empty()) {
            return Err(anyhow::anyhow!("Tautulli server url is not configured"));
        }
        if self.export.user.as_deref().map_or(true, |user| user.trim().is_empty()) {
            return Err(anyhow::anyhow!("user to export is not configured"));
        }
        self.validate_values()
    }

    /// Range checks only. Unset url and user pass, so a partially written
    /// config file can still be saved.
    pub fn validate_values(&self) -> anyhow::Result<()> {
        if let Some(url) = self.server.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("Tautulli server url must start with http:// or https://: {}", url));
            }
        }

        let threshold = self.export.watched_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(anyhow::anyhow!("watched_threshold must be between 0 and 100, got {}", threshold));
        }

        if self.export.page_size == 0 {
            return Err(anyhow::anyhow!("page_size must be greater than 0"));
        }

        if self.server.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("timeout_seconds must be greater than 0"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Use one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
