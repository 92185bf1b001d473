//! Configuration loading for elscan.

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::engine::{DEFAULT_CACHE_SIZE, SearchOptions};
use crate::provider::Edition;
use crate::provider::local::LocalTextProvider;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ELSCAN_CONFIG";

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Defaults for every search; command-line flags override them.
    #[serde(default)]
    pub search: SearchOptions,
    #[serde(default)]
    pub texts: TextsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Where book files live and which edition they follow.
#[derive(Debug, Default, Deserialize)]
pub struct TextsConfig {
    pub dir: Option<String>,
    #[serde(default)]
    pub edition: Edition,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    DEFAULT_CACHE_SIZE
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

impl Config {
    /// Load config from `$ELSCAN_CONFIG` or ~/.config/elscan/config.toml,
    /// or return defaults when neither file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let contents = std::fs::read_to_string(&path)?;
            let config = Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?;
            tracing::debug!(path = %path.display(), "config loaded");
            return Ok(config);
        }

        Ok(Config::default())
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid config TOML.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "elscan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Texts directory: the configured one, else the platform data dir.
    #[must_use]
    pub fn texts_dir(&self) -> PathBuf {
        if let Some(dir) = &self.texts.dir {
            return expand_tilde(dir);
        }
        ProjectDirs::from("", "", "elscan")
            .map_or_else(|| PathBuf::from("texts"), |dirs| dirs.data_dir().join("texts"))
    }

    #[must_use]
    pub fn text_provider(&self) -> LocalTextProvider {
        LocalTextProvider::new(self.texts_dir(), self.texts.edition)
    }
}

/// Expand ~ to the user's home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(base_dirs) = BaseDirs::new()
    {
        return base_dirs.home_dir().join(rest);
    }
    PathBuf::from(path)
}
