//! Thumbnailer configuration.
//!
//! Handles loading and validating a `thumbnailer.toml` file. Every option has
//! a default, so a config file only needs the values it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! cache_path = "assets/thumbnails"   # Where artifacts are written
//! cache_url = "/assets/thumbnails"   # Public URL of cache_path
//! dir_mode = 0o755                   # Mode for new shard directories
//! extensions = ["jpg", "png"]        # Source formats to thumbnail
//! drivers = ["image", "imagemagick", "graphicsmagick"]
//! quality = 90                       # Fallback JPEG quality (1-100)
//!
//! [encoder]
//! command = "ffmpeg"
//! codec = "libaom-av1"
//! timeout_secs = 120
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Driver;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Thumbnailer configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailerConfig {
    /// Directory holding the sharded cache.
    pub cache_path: PathBuf,
    /// Public URL prefix mirroring `cache_path`.
    pub cache_url: String,
    /// Permission bits for newly created cache directories.
    pub dir_mode: u32,
    /// Source extensions that are thumbnailed; anything else passes through.
    pub extensions: Vec<String>,
    /// Decoding drivers in order of preference; the first available one is used.
    pub drivers: Vec<Driver>,
    /// JPEG quality of the fallback artifact.
    pub quality: u32,
    pub encoder: EncoderConfig,
    pub processing: ProcessingConfig,
}

impl Default for ThumbnailerConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("assets/thumbnails"),
            cache_url: "/assets/thumbnails".to_string(),
            dir_mode: 0o755,
            extensions: vec!["jpg".to_string(), "png".to_string()],
            drivers: vec![Driver::Image, Driver::Imagemagick, Driver::Graphicsmagick],
            quality: 90,
            encoder: EncoderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ThumbnailerConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if self.drivers.is_empty() {
            return Err(ConfigError::Validation("drivers must not be empty".into()));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.dir_mode > 0o7777 {
            return Err(ConfigError::Validation(format!(
                "dir_mode {:o} is not a permission mode",
                self.dir_mode
            )));
        }
        if self.encoder.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "encoder.timeout_secs must be positive".into(),
            ));
        }
        if self.encoder.command.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "encoder.command must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Configured extensions, lowercased with `jpeg` folded into `jpg`.
    pub fn normalized_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self
            .extensions
            .iter()
            .map(|e| {
                let e = e.trim_start_matches('.').to_ascii_lowercase();
                if e == "jpeg" { "jpg".to_string() } else { e }
            })
            .collect();
        exts.sort();
        exts.dedup();
        exts
    }
}

/// External encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Executable name or path.
    pub command: PathBuf,
    /// Value passed to `-c:v`.
    pub codec: String,
    /// Seconds before a running encode is killed.
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("ffmpeg"),
            codec: "libaom-av1".to_string(),
            timeout_secs: 120,
        }
    }
}

impl EncoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# AVIF Thumbnailer Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory where thumbnails are cached. Files are sharded into
# two-character sub-directories: <cache_path>/3f/3fa9...e1.jpg
cache_path = "assets/thumbnails"

# Public URL of cache_path, used to build <img> and <source> URLs.
cache_url = "/assets/thumbnails"

# Permission mode for newly created cache directories.
dir_mode = 0o755

# Source extensions to thumbnail. Other files are passed through unchanged.
# "jpeg" is treated as "jpg".
extensions = ["jpg", "png"]

# Decoding drivers for the fallback thumbnail, in order of preference.
# The first one available on this host is used:
#   image          - built-in pure Rust decoder (always available)
#   imagemagick    - the `magick` command
#   graphicsmagick - the `gm` command
drivers = ["image", "imagemagick", "graphicsmagick"]

# JPEG quality of the fallback thumbnail (1-100).
quality = 90

# ---------------------------------------------------------------------------
# AVIF encoder
# ---------------------------------------------------------------------------
[encoder]
# ffmpeg executable, by name (looked up in PATH) or absolute path.
command = "ffmpeg"

# Video codec used for the AVIF still picture.
codec = "libaom-av1"

# Seconds before a stuck encode is killed. The thumbnail is then served
# without its AVIF source until the original image changes.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers. Omit to use all CPU cores.
# Values larger than the core count are clamped down.
# max_processes = 4
"##
}
