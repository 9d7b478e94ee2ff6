//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides. The values
//! here are defaults for the `pond` command-line tool; the library itself
//! takes all of its options explicitly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::pipeline::processor::{AlignMethod, FillMethod};
use crate::pipeline::{PipelineError, ProcessorError, Window};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a command does not say otherwise
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDefaults {
    /// Window for align and rollup: a duration such as `5m`, or a calendar
    /// window for rollups
    #[serde(default = "default_window")]
    pub window: String,

    #[serde(default = "default_align_method")]
    pub align_method: String,

    #[serde(default = "default_fill_method")]
    pub fill_method: String,

    #[serde(default)]
    pub fill_limit: Option<usize>,

    #[serde(default = "default_allow_negative")]
    pub allow_negative: bool,
}

fn default_window() -> String {
    "5m".to_string()
}

fn default_align_method() -> String {
    "linear".to_string()
}

fn default_fill_method() -> String {
    "zero".to_string()
}

fn default_allow_negative() -> bool {
    true
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            window: default_window(),
            align_method: default_align_method(),
            fill_method: default_fill_method(),
            fill_limit: None,
            allow_negative: default_allow_negative(),
        }
    }
}

impl PipelineDefaults {
    pub fn window(&self) -> Result<Window, PipelineError> {
        Window::parse(&self.window)
    }

    pub fn align_method(&self) -> Result<AlignMethod, ProcessorError> {
        self.align_method.parse()
    }

    pub fn fill_method(&self) -> Result<FillMethod, ProcessorError> {
        self.fill_method.parse()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("pond").join("config.toml")),
            Some(PathBuf::from("/etc/pond/config.toml")),
            Some(PathBuf::from("./pond.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Pipeline overrides
        if let Ok(window) = std::env::var("POND_WINDOW") {
            self.pipeline.window = window;
        }
        if let Ok(method) = std::env::var("POND_ALIGN_METHOD") {
            self.pipeline.align_method = method;
        }
        if let Ok(method) = std::env::var("POND_FILL_METHOD") {
            self.pipeline.fill_method = method;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("POND_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("POND_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# pond configuration
#
# Environment variables override these settings:
# - POND_WINDOW
# - POND_ALIGN_METHOD
# - POND_FILL_METHOD
# - POND_LOG_LEVEL
# - POND_LOG_FORMAT

[pipeline]
# Window for align and rollup: 30s, 5m, 1h, 1d, or daily/monthly/yearly
window = "5m"

# Align interpolation: linear or hold
align_method = "linear"

# Fill method: zero, pad or linear
fill_method = "zero"

# Maximum consecutive fills per field (unset for no limit)
# fill_limit = 3

# Keep negative rates (set false for monotonic counters)
allow_negative = true

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty or json
format = "pretty"
"#
    .to_string()
}
