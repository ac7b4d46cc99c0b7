use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a single hvec invocation
#[derive(Error, Debug)]
pub enum HvecError {
    #[error("Input file not found at '{}'", .0.display())]
    InputNotFound(PathBuf),

    #[error("Subtitle file not found at '{}'", .0.display())]
    SubtitleNotFound(PathBuf),

    #[error("Quality {0} is out of range (expected 1-51)")]
    InvalidQuality(u8),

    #[error("Unknown preset '{0}' (expected one of: veryfast, faster, fast, medium, slow, slower, veryslow)")]
    InvalidPreset(String),

    /// The executable could not be found on PATH or at the configured location
    #[error("'{0}' not found. Is FFmpeg installed and in your PATH?")]
    ToolNotFound(String),

    #[error("{tool} failed with exit code {code}")]
    ToolFailed { tool: String, code: i32 },

    #[error("{tool} was terminated by a signal")]
    ToolTerminated { tool: String },

    /// Probe output missing or unparsable; only ever reported as an advisory
    #[error("Could not analyze video: {0}")]
    Probe(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HvecError {
    /// True for errors detected before any external process was spawned
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HvecError::InputNotFound(_)
                | HvecError::SubtitleNotFound(_)
                | HvecError::InvalidQuality(_)
                | HvecError::InvalidPreset(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HvecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_names_code() {
        let err = HvecError::ToolFailed { tool: "ffmpeg".to_string(), code: 183 };
        assert_eq!(err.to_string(), "ffmpeg failed with exit code 183");
    }

    #[test]
    fn test_tool_not_found_is_distinct_from_failure() {
        let err = HvecError::ToolNotFound("ffmpeg".to_string());
        assert!(err.to_string().contains("'ffmpeg' not found"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(HvecError::InputNotFound(PathBuf::from("a.mp4")).is_configuration());
        assert!(HvecError::SubtitleNotFound(PathBuf::from("a.srt")).is_configuration());
        assert!(HvecError::InvalidQuality(0).is_configuration());
        assert!(!HvecError::ToolFailed { tool: "ffmpeg".into(), code: 1 }.is_configuration());
    }
}
