//! Optional `config.toml` in the listing root.
//!
//! The file is sparse: any key it sets replaces the stock value, and every
//! key it omits keeps it.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Every key is optional; these are the stock values
//!
//! [images]
//! max_width = 1920          # Main images wider than this are scaled down
//! quality = 85              # Main image JPEG quality (1-100)
//!
//! [thumbnails]
//! width = 400               # Thumbnail bounding box width
//! height = 300              # Thumbnail bounding box height
//! quality = 80              # Thumbnail JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! A misspelled key is an error rather than a silently ignored setting.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file in the listing root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {CONFIG_FILENAME}: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed {CONFIG_FILENAME}: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Validation(String),
}

/// Build configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub images: ImagesConfig,
    pub thumbnails: ThumbnailsConfig,
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    /// Reject settings no encoder can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width and thumbnails.height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Main image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum output width in pixels. Narrower images are never upscaled.
    pub max_width: u32,
    /// JPEG quality for main images.
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            quality: 85,
        }
    }
}

/// Thumbnail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Bounding box width. Thumbnails fit inside the box on both axes.
    pub width: u32,
    /// Bounding box height.
    pub height: u32,
    /// JPEG quality for thumbnails.
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            quality: 80,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on image workers. `None` uses every core.
    pub max_processes: Option<usize>,
}

/// Worker count for the optimizer pool: `max_processes` capped at the
/// machine's core count, or every core when unset.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    config.max_processes.map_or(cores, |n| n.clamp(1, cores))
}

// =============================================================================
// Loading
// =============================================================================

/// Parse and validate config text. Keys the text leaves out keep their
/// stock value.
pub fn parse_config(text: &str) -> Result<BuildConfig, ConfigError> {
    let config: BuildConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from a listing root. A missing file yields the stock
/// defaults.
pub fn load_config(listing_root: &Path) -> Result<BuildConfig, ConfigError> {
    match fs::read_to_string(listing_root.join(CONFIG_FILENAME)) {
        Ok(text) => parse_config(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BuildConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tour-gen build configuration
# ============================
# Place this file next to listing.json. All settings are optional; values
# shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Main gallery images
# ---------------------------------------------------------------------------
[images]
# Images wider than this are scaled down (aspect ratio preserved).
# Narrower images keep their original resolution.
max_width = 1920

# JPEG quality for main images (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Thumbnails are scaled down to fit inside width x height.
width = 400
height = 300

# JPEG quality for thumbnails (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cores() -> usize {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn stock_values() {
        let config = BuildConfig::default();
        assert_eq!(config.images.max_width, 1920);
        assert_eq!(config.images.quality, 85);
        assert_eq!((config.thumbnails.width, config.thumbnails.height), (400, 300));
        assert_eq!(config.thumbnails.quality, 80);
        assert!(config.processing.max_processes.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sparse_file_keeps_other_stock_values() {
        let config = parse_config("[images]\nmax_width = 1600\n").unwrap();
        assert_eq!(config.images.max_width, 1600);
        assert_eq!(config.images.quality, 85);
        assert_eq!(config.thumbnails, ThumbnailsConfig::default());
    }

    #[test]
    fn empty_text_is_stock() {
        assert_eq!(parse_config("").unwrap(), BuildConfig::default());
    }

    #[test]
    fn misspelled_key_is_rejected() {
        assert!(matches!(
            parse_config("[images]\nmax_widht = 10\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            parse_config("[colors]\nlight = 1\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for text in [
            "[images]\nquality = 0\n",
            "[images]\nquality = 101\n",
            "[images]\nmax_width = 0\n",
            "[thumbnails]\nheight = 0\n",
            "[thumbnails]\nquality = 0\n",
            "[processing]\nmax_processes = 0\n",
        ] {
            assert!(
                matches!(parse_config(text), Err(ConfigError::Validation(_))),
                "{text:?}"
            );
        }
    }

    #[test]
    fn stock_file_parses_to_stock_values() {
        assert_eq!(parse_config(stock_config_toml()).unwrap(), BuildConfig::default());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn missing_file_is_stock() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), BuildConfig::default());
    }

    #[test]
    fn file_in_listing_root_is_read() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[thumbnails]\nwidth = 200\nheight = 200\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!((config.thumbnails.width, config.thumbnails.height), (200, 200));
        assert_eq!(config.thumbnails.quality, 80);
    }

    #[test]
    fn broken_file_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[images\nbroken").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Worker count
    // =========================================================================

    #[test]
    fn threads_default_to_all_cores() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores());
    }

    #[test]
    fn threads_never_exceed_cores() {
        let config = ProcessingConfig {
            max_processes: Some(cores() + 64),
        };
        assert_eq!(effective_threads(&config), cores());
    }

    #[test]
    fn threads_can_be_lowered() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
