use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::errors::SweepError;

const MIB: u64 = 1024 * 1024;

/// Global treesweep configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Videos at least this large survive a prune (MB)
    #[serde(default = "default_min_video_mb")]
    pub min_video_size_mb: u64,

    /// Videos smaller than this are removed by `small-videos` (MB)
    #[serde(default = "default_small_video_mb")]
    pub small_video_threshold_mb: u64,

    /// Read chunk used when hashing (KB)
    #[serde(default = "default_hash_chunk_kb")]
    pub hash_chunk_kb: usize,

    /// Extensions treated as video (lowercase, no dot)
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    /// Extensions treated as image (lowercase, no dot)
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Extensions removed by `junk`
    #[serde(default = "default_junk_extensions")]
    pub junk_extensions: Vec<String>,

    /// Filename keywords that mark an image for removal
    #[serde(default = "default_image_keywords")]
    pub image_keywords: Vec<String>,

    /// Paths under this root win keeper selection
    #[serde(default)]
    pub preferred_root: Option<PathBuf>,

    /// Where unverified duplicates are moved to
    #[serde(default)]
    pub quarantine_dir: Option<PathBuf>,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

fn default_min_video_mb() -> u64 {
    200
}
fn default_small_video_mb() -> u64 {
    100
}
fn default_hash_chunk_kb() -> usize {
    64
}
fn default_video_extensions() -> Vec<String> {
    to_strings(&[
        "3gp", "avi", "flv", "iso", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "mts",
        "ogv", "rmvb", "ts", "vob", "webm", "wmv",
    ])
}
fn default_image_extensions() -> Vec<String> {
    to_strings(&[
        "bmp", "gif", "heic", "heif", "jpeg", "jpg", "png", "tif", "tiff", "webp",
    ])
}
fn default_junk_extensions() -> Vec<String> {
    to_strings(&["txt", "url", "html", "htm", "mhtml", "apk"])
}
fn default_image_keywords() -> Vec<String> {
    Vec::new()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_video_size_mb: default_min_video_mb(),
            small_video_threshold_mb: default_small_video_mb(),
            hash_chunk_kb: default_hash_chunk_kb(),
            video_extensions: default_video_extensions(),
            image_extensions: default_image_extensions(),
            junk_extensions: default_junk_extensions(),
            image_keywords: default_image_keywords(),
            preferred_root: None,
            quarantine_dir: None,
            output_format: OutputFormat::Human,
        }
    }
}

impl Config {
    /// Get the treesweep data directory (~/.treesweep)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".treesweep")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents).map_err(|e| SweepError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Save config to the given file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Initialize the data and log directories
    pub fn init_dirs() -> Result<()> {
        for dir in [Self::data_dir(), Self::logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<(), SweepError> {
        if self.hash_chunk_kb == 0 {
            return Err(SweepError::Config {
                path: path.to_path_buf(),
                message: "hash_chunk_kb must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn min_video_bytes(&self) -> u64 {
        self.min_video_size_mb * MIB
    }

    pub fn small_video_bytes(&self) -> u64 {
        self.small_video_threshold_mb * MIB
    }

    pub fn hash_chunk_bytes(&self) -> usize {
        self.hash_chunk_kb * 1024
    }

    pub fn video_set(&self) -> BTreeSet<String> {
        normalize_extensions(&self.video_extensions)
    }

    pub fn image_set(&self) -> BTreeSet<String> {
        normalize_extensions(&self.image_extensions)
    }

    pub fn junk_set(&self) -> BTreeSet<String> {
        normalize_extensions(&self.junk_extensions)
    }
}

/// Lowercase extensions and strip any leading dot (".MP4" -> "mp4")
pub fn normalize_extensions<S: AsRef<str>>(exts: &[S]) -> BTreeSet<String> {
    exts.iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
