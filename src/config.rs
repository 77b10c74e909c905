//! Configuration file support
//!
//! Optional TOML file with extraction, cache and overlap settings.
//! Command-line flags take precedence over file values.
//!
//! ```toml
//! [extraction]
//! concurrency = 8
//! text_timeout_ms = 2000
//!
//! [cache]
//! enabled = true
//! dir = "/var/cache/canonical-pages"
//!
//! [overlap]
//! threshold = 0.5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::DEFAULT_OVERLAP_THRESHOLD;
use crate::extract::{ExtractionOptions, DEFAULT_CONCURRENCY, DEFAULT_TEXT_TIMEOUT_MS};

/// Application directory name under the platform config and cache dirs
pub const APP_DIR_NAME: &str = "canonical-pages";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `[extraction]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    pub concurrency: usize,
    /// 0 disables the per-call timeout
    pub text_timeout_ms: u64,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            text_timeout_ms: DEFAULT_TEXT_TIMEOUT_MS,
        }
    }
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// `[overlap]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapSection {
    pub threshold: f64,
}

impl Default for OverlapSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionSection,
    pub cache: CacheSection,
    pub overlap: OverlapSection,
}

/// Command-line values that override the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub concurrency: Option<usize>,
    pub text_timeout_ms: Option<u64>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Default config file location (`<config dir>/canonical-pages/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location; a missing file gives defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.extraction.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "extraction.concurrency must be at least 1".to_string(),
            ));
        }
        if !(self.overlap.threshold > 0.0 && self.overlap.threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "overlap.threshold must be in (0, 1], got {}",
                self.overlap.threshold
            )));
        }
        Ok(())
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(concurrency) = cli.concurrency {
            self.extraction.concurrency = concurrency;
        }
        if let Some(timeout) = cli.text_timeout_ms {
            self.extraction.text_timeout_ms = timeout;
        }
        if cli.no_cache {
            self.cache.enabled = false;
        }
        if let Some(dir) = &cli.cache_dir {
            self.cache.dir = Some(dir.clone());
        }
        self
    }

    /// Extraction options (concurrency clamped)
    pub fn extraction_options(&self) -> ExtractionOptions {
        let builder = ExtractionOptions::builder().concurrency(self.extraction.concurrency);
        if self.extraction.text_timeout_ms == 0 {
            builder.no_timeout().build()
        } else {
            builder
                .text_timeout(Duration::from_millis(self.extraction.text_timeout_ms))
                .build()
        }
    }

    /// Cache directory, if caching is enabled and a location is known
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        self.cache
            .dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.extraction.concurrency, 4);
        assert_eq!(config.extraction.text_timeout_ms, 5_000);
        assert!(config.cache.enabled);
        assert_eq!(config.overlap.threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml("[extraction]\nconcurrency = 8\n").unwrap();
        assert_eq!(config.extraction.concurrency, 8);
        assert_eq!(config.extraction.text_timeout_ms, 5_000);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            [extraction]
            concurrency = 2
            text_timeout_ms = 0

            [cache]
            enabled = true
            dir = "/tmp/pages"

            [overlap]
            threshold = 0.8
        "#;
        let config = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(config.cache_dir(), Some(PathBuf::from("/tmp/pages")));
        assert_eq!(config.overlap.threshold, 0.8);

        let options = config.extraction_options();
        assert_eq!(options.concurrency, 2);
        assert_eq!(options.text_timeout, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_toml("[extraction]\nconcurrency = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("[overlap]\nthreshold = 1.5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("[extraction\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_merge_with_cli() {
        let cli = CliOverrides {
            concurrency: Some(16),
            text_timeout_ms: Some(100),
            no_cache: true,
            cache_dir: Some(PathBuf::from("/tmp/other")),
        };
        let config = EngineConfig::default().merge_with_cli(&cli);
        assert_eq!(config.extraction.concurrency, 16);
        assert_eq!(
            config.extraction_options().text_timeout,
            Some(Duration::from_millis(100))
        );
        assert_eq!(config.cache_dir(), None);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nenabled = false\n").unwrap();

        let config = EngineConfig::load_from_path(&path).unwrap();
        assert!(!config.cache.enabled);

        let missing = EngineConfig::load_from_path(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
