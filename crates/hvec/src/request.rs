use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::HvecError;

/// Container extension written when no output path is given
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mkv";

/// How the video stream is carried into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Re-encode video to HEVC on the hardware encoder
    Transcode,
    /// Repackage existing streams without re-encoding
    Remux,
}

/// Encoder speed/compression trade-off, fastest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Veryfast,
        Preset::Faster,
        Preset::Fast,
        Preset::Medium,
        Preset::Slow,
        Preset::Slower,
        Preset::Veryslow,
    ];

    /// Name as understood by the encoder's `-preset` option
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Medium
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Preset {
    type Err = HvecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| HvecError::InvalidPreset(s.to_string()))
    }
}

/// Encoder global quality; lower values mean higher fidelity and larger files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 51;

    pub fn new(value: u8) -> Result<Self, HvecError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Quality(value))
        } else {
            Err(HvecError::InvalidQuality(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to process one input file
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    /// External subtitle file muxed in as a second input
    pub subtitles: Option<PathBuf>,
    pub quality: Quality,
    pub preset: Preset,
    pub audio_codec: String,
    pub audio_bitrate: Option<String>,
    pub delete_source: bool,
    pub recursive: bool,
    /// Skip inputs whose video is already HEVC
    pub skip_hevc: bool,
    pub quiet: bool,
    /// Periodic status lines instead of a continuously redrawn progress line
    pub reduced_noise: bool,
    pub convert_subtitles: bool,
    pub dry_run: bool,
    pub overwrite: bool,
}

impl TranscodeRequest {
    /// Create a transcode request with default options; `output` falls back to
    /// [`default_output_path`].
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        let input = input.into();
        let output = output.unwrap_or_else(|| default_output_path(&input));
        TranscodeRequest {
            input,
            output,
            mode: Mode::Transcode,
            subtitles: None,
            quality: Quality(24),
            preset: Preset::Medium,
            audio_codec: "copy".to_string(),
            audio_bitrate: None,
            delete_source: false,
            recursive: false,
            skip_hevc: false,
            quiet: false,
            reduced_noise: false,
            convert_subtitles: false,
            dry_run: false,
            overwrite: false,
        }
    }

    /// True when the output container is Matroska
    pub fn output_is_mkv(&self) -> bool {
        has_extension(&self.output, DEFAULT_OUTPUT_EXTENSION)
    }

    /// True when subtitles should be converted to SRT rather than copied
    pub fn converts_subtitles(&self) -> bool {
        self.output_is_mkv() || self.convert_subtitles
    }

    /// True when audio is re-encoded instead of stream-copied
    pub fn reencodes_audio(&self) -> bool {
        self.mode == Mode::Transcode && !self.audio_codec.eq_ignore_ascii_case("copy")
    }
}

/// Derive an output path by swapping the input's extension for `.mkv`.
///
/// An input that is already Matroska gets a `.hevc` infix so the source is
/// never written over.
pub fn default_output_path(input: &Path) -> PathBuf {
    if has_extension(input, DEFAULT_OUTPUT_EXTENSION) {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        input.with_file_name(format!("{}.hevc.{}", stem, DEFAULT_OUTPUT_EXTENSION))
    } else {
        input.with_extension(DEFAULT_OUTPUT_EXTENSION)
    }
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
