use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::request::{Preset, Quality};

/// Environment variable overriding `ffmpeg_bin`
pub const FFMPEG_ENV: &str = "HVEC_FFMPEG";
/// Environment variable overriding `ffprobe_bin`
pub const FFPROBE_ENV: &str = "HVEC_FFPROBE";

/// Tool locations and encoding defaults for hvec
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HvecConfig {
    /// Path to the ffmpeg binary
    pub ffmpeg_bin: PathBuf,
    /// Path to the ffprobe binary
    pub ffprobe_bin: PathBuf,
    /// Global hardware decode hint passed as `-hwaccel`
    pub hwaccel: String,
    /// Hardware HEVC encoder passed as `-c:v` in transcode mode
    pub video_encoder: String,
    /// Assumed encode throughput (frames/second) used for time estimates
    pub estimated_fps: f64,
    /// Progress interval in seconds when reduced progress noise is requested
    pub stats_period_secs: u32,
    /// Language tag written for an embedded external subtitle track
    pub subtitle_language: String,
    /// Quality used when none is given on the command line
    pub default_quality: u8,
    /// Preset used when none is given on the command line
    pub default_preset: Preset,
    /// Extensions picked up by recursive directory scans
    pub media_extensions: Vec<String>,
}

impl Default for HvecConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl HvecConfig {
    /// Create a default configuration for Intel QSV encoding
    pub fn default_config() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            hwaccel: "qsv".to_string(),
            video_encoder: "hevc_qsv".to_string(),
            estimated_fps: 85.0,
            stats_period_secs: 30,
            subtitle_language: "eng".to_string(),
            default_quality: 24,
            default_preset: Preset::Medium,
            media_extensions: ["mkv", "mp4", "m4v", "avi", "mov", "webm", "ts"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            } else {
                log::warn!("Config file {} does not exist, using defaults", config_path.display());
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bin) = lookup(FFMPEG_ENV).filter(|s| !s.is_empty()) {
            self.ffmpeg_bin = PathBuf::from(bin);
        }
        if let Some(bin) = lookup(FFPROBE_ENV).filter(|s| !s.is_empty()) {
            self.ffprobe_bin = PathBuf::from(bin);
        }
    }

    fn validate(&self) -> Result<()> {
        Quality::new(self.default_quality).context("Invalid default_quality in config")?;
        Ok(())
    }
}
