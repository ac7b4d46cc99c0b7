use std::collections::HashMap;
use std::path::Path;
use log::debug;
use serde::Deserialize;
use crate::command::ToolCommand;
use crate::config::HvecConfig;
use crate::error::{HvecError, Result};
use crate::runner::ProcessRunner;

/// Complete ffprobe output structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FFProbeData {
    #[serde(default)]
    pub streams: Vec<FFProbeStream>,
    #[serde(default)]
    pub format: FFProbeFormat,
}

/// Format-level metadata from ffprobe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FFProbeFormat {
    pub format_name: Option<String>,
    /// Container duration in seconds, as a decimal string
    pub duration: Option<String>,
    pub size: Option<String>,
    pub bit_rate: Option<String>,
    pub tags: Option<HashMap<String, String>>,
}

/// Stream-level metadata from ffprobe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FFProbeStream {
    #[serde(default)]
    pub index: i32,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Rational such as "24000/1001"
    pub avg_frame_rate: Option<String>,
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
    /// Frame count; absent for many Matroska sources
    pub nb_frames: Option<String>,
    pub bit_rate: Option<String>,
    pub tags: Option<HashMap<String, String>>,
}

impl FFProbeData {
    /// First video stream, if any
    pub fn video_stream(&self) -> Option<&FFProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }

    /// Codec name of the first video stream, lowercased
    pub fn video_codec(&self) -> Option<String> {
        self.video_stream()
            .and_then(|s| s.codec_name.as_deref())
            .map(|c| c.to_lowercase())
    }

    /// True when the first video stream is already HEVC
    pub fn is_hevc(&self) -> bool {
        matches!(self.video_codec().as_deref(), Some("hevc") | Some("h265"))
    }

    pub fn parse(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json)
            .map_err(|e| HvecError::Probe(format!("invalid ffprobe JSON: {}", e)))
    }
}

/// ffprobe invocation requesting JSON stream and format metadata
pub fn probe_command(cfg: &HvecConfig, file_path: &Path) -> ToolCommand {
    ToolCommand::new(
        &cfg.ffprobe_bin,
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            file_path.to_string_lossy().to_string(),
        ],
    )
}

/// ffprobe invocation printing the human-readable stream summary
pub fn info_command(cfg: &HvecConfig, file_path: &Path) -> ToolCommand {
    ToolCommand::new(
        &cfg.ffprobe_bin,
        vec![
            "-hide_banner".to_string(),
            file_path.to_string_lossy().to_string(),
        ],
    )
}

/// Run ffprobe and parse the JSON output
pub async fn probe_file<R: ProcessRunner>(
    runner: &R,
    cfg: &HvecConfig,
    file_path: &Path,
) -> Result<FFProbeData> {
    if !file_path.exists() {
        return Err(HvecError::InputNotFound(file_path.to_path_buf()));
    }

    debug!("Probing {}", file_path.display());
    let stdout = runner.capture(&probe_command(cfg, file_path)).await?;
    FFProbeData::parse(&stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "audio", "codec_name": "aac"},
            {"index": 1, "codec_type": "video", "codec_name": "H264",
             "width": 1920, "height": 1080, "avg_frame_rate": "24000/1001",
             "duration": "5400.123", "nb_frames": "129483"},
            {"index": 2, "codec_type": "subtitle", "codec_name": "mov_text"}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "5400.200000", "size": "4294967296"}
    }"#;

    #[test]
    fn test_parse_sample() {
        let data = FFProbeData::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.streams.len(), 3);
        assert_eq!(data.format.duration.as_deref(), Some("5400.200000"));

        let video = data.video_stream().unwrap();
        assert_eq!(video.index, 1);
        assert_eq!(video.nb_frames.as_deref(), Some("129483"));
        assert_eq!(data.video_codec().as_deref(), Some("h264"));
        assert!(!data.is_hevc());
    }

    #[test]
    fn test_hevc_detection() {
        let json = r#"{"streams": [{"codec_type": "video", "codec_name": "hevc"}], "format": {}}"#;
        assert!(FFProbeData::parse(json.as_bytes()).unwrap().is_hevc());
    }

    #[test]
    fn test_missing_sections_default() {
        let data = FFProbeData::parse(b"{}").unwrap();
        assert!(data.streams.is_empty());
        assert!(data.video_stream().is_none());
    }

    #[test]
    fn test_garbage_is_probe_error() {
        assert!(matches!(FFProbeData::parse(b"not json"), Err(HvecError::Probe(_))));
    }

    #[test]
    fn test_probe_command_args() {
        let cmd = probe_command(&HvecConfig::default(), Path::new("in put.mkv"));
        assert_eq!(cmd.program, Path::new("ffprobe"));
        assert_eq!(
            cmd.args,
            vec!["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams", "in put.mkv"]
        );
    }

    #[test]
    fn test_info_command_args() {
        let cmd = info_command(&HvecConfig::default(), Path::new("movie.mp4"));
        assert_eq!(cmd.args, vec!["-hide_banner", "movie.mp4"]);
    }
}
