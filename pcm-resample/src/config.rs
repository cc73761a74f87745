//! Configuration for pcm-resample
//!
//! Settings are resolved in this order:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file (`--config`)
//! 4. Built-in defaults (code constants)
//!
//! The library only consumes [`ResamplerConfig`]; the rest is bootstrap for the
//! command-line tool.

use crate::audio::engine::DEFAULT_CHUNK_FRAMES;
use crate::audio::types::{Quality, SampleFormat};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Conversion defaults
    #[serde(default)]
    pub resampler: ResamplerConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conversion parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Input sample rate in Hz
    pub input_rate: f64,

    /// Output sample rate in Hz. No default; zero is rejected when the
    /// resampler is built.
    pub output_rate: f64,

    /// Interleaved channel count
    pub channels: usize,

    pub format: SampleFormat,

    pub quality: Quality,

    /// Treat successive writes as one continuous stream
    pub stream: bool,

    /// Input frames per engine block
    pub chunk_frames: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            input_rate: 44_100.0,
            output_rate: 0.0,
            channels: 2,
            format: SampleFormat::Int16,
            quality: Quality::High,
            stream: false,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject settings that can never be valid. Rates and channel counts are
    /// checked when the resampler is built, since the command line may still
    /// override them.
    fn validate(&self) -> Result<()> {
        if self.resampler.chunk_frames == 0 {
            return Err(Error::Config("chunk_frames must be at least 1".to_string()));
        }
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(Error::Config(format!("Invalid log level '{}'", other))),
        }
    }
}
