use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use crate::config::HvecConfig;
use crate::request::{Mode, TranscodeRequest};

/// Subtitle codec used when subtitles are converted rather than copied
pub const SRT_CODEC: &str = "srt";
/// Stream copy directive
pub const COPY_CODEC: &str = "copy";

/// A program plus its ordered arguments, ready to hand to a runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        ToolCommand {
            program: program.into(),
            args,
        }
    }

    /// Short program name used in error messages
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    pub fn os_args(&self) -> Vec<OsString> {
        self.args.iter().map(OsString::from).collect()
    }

    /// Final argument; for ffmpeg this is the output path
    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(|s| s.as_str())
    }

    /// True when `flag` is immediately followed by `value` anywhere in the args
    pub fn has_pair(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }
}

impl Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", quote_token(&self.program.display().to_string()))?;
        for arg in &self.args {
            write!(f, " {}", quote_token(arg))?;
        }
        Ok(())
    }
}

fn quote_token(token: &str) -> String {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        format!("\"{}\"", token)
    } else {
        token.to_string()
    }
}

/// Command builder for generating ffmpeg command lines from a request
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    ffmpeg_bin: PathBuf,
    hwaccel: String,
    video_encoder: String,
    stats_period_secs: u32,
    subtitle_language: String,
}

impl CommandBuilder {
    pub fn new(cfg: &HvecConfig) -> Self {
        CommandBuilder {
            ffmpeg_bin: cfg.ffmpeg_bin.clone(),
            hwaccel: cfg.hwaccel.clone(),
            video_encoder: cfg.video_encoder.clone(),
            stats_period_secs: cfg.stats_period_secs,
            subtitle_language: cfg.subtitle_language.clone(),
        }
    }

    /// Build the full ffmpeg invocation for a request.
    ///
    /// Mode and the presence of an external subtitle file select the stream
    /// mapping; the subtitle codec rule is the same in both modes.
    pub fn build(&self, req: &TranscodeRequest) -> ToolCommand {
        let mut args = Vec::new();

        args.extend(self.noise_args(req));

        if req.overwrite {
            args.push("-y".to_string());
        }

        // Decode hint only. No -c:v before -i: forcing an input decoder breaks
        // sources that don't match it, so ffmpeg auto-detects instead.
        if req.mode == Mode::Transcode {
            args.push("-hwaccel".to_string());
            args.push(self.hwaccel.clone());
        }

        args.push("-i".to_string());
        args.push(path_arg(&req.input));
        if let Some(subs) = &req.subtitles {
            args.push("-i".to_string());
            args.push(path_arg(subs));
        }

        args.extend(self.mapping_args(req));
        args.extend(self.video_args(req));
        args.extend(audio_args(req));
        args.push("-c:s".to_string());
        args.push(subtitle_codec(req).to_string());

        args.push(path_arg(&req.output));

        ToolCommand::new(&self.ffmpeg_bin, args)
    }

    fn noise_args(&self, req: &TranscodeRequest) -> Vec<String> {
        if req.quiet {
            vec!["-loglevel".to_string(), "error".to_string()]
        } else if req.reduced_noise {
            vec!["-stats_period".to_string(), self.stats_period_secs.to_string()]
        } else {
            vec![]
        }
    }

    fn mapping_args(&self, req: &TranscodeRequest) -> Vec<String> {
        let mut args = vec![
            "-map".to_string(), "0:v:0".to_string(),
            "-map".to_string(), "0:a?".to_string(),
        ];
        match req.subtitles {
            Some(_) => {
                args.push("-map".to_string());
                args.push("1:s".to_string());
                args.push("-metadata:s:s:0".to_string());
                args.push(format!("language={}", self.subtitle_language));
            }
            None => {
                args.push("-map".to_string());
                args.push("0:s?".to_string());
            }
        }
        args
    }

    fn video_args(&self, req: &TranscodeRequest) -> Vec<String> {
        match req.mode {
            Mode::Remux => vec!["-c:v".to_string(), COPY_CODEC.to_string()],
            Mode::Transcode => vec![
                "-c:v".to_string(), self.video_encoder.clone(),
                "-preset".to_string(), req.preset.to_string(),
                "-global_quality".to_string(), req.quality.to_string(),
            ],
        }
    }
}

fn audio_args(req: &TranscodeRequest) -> Vec<String> {
    if !req.reencodes_audio() {
        return vec!["-c:a".to_string(), COPY_CODEC.to_string()];
    }
    let mut args = vec!["-c:a".to_string(), req.audio_codec.clone()];
    if let Some(bitrate) = &req.audio_bitrate {
        args.push("-b:a".to_string());
        args.push(bitrate.clone());
    }
    args
}

/// SRT when the output is Matroska or conversion was requested, copy otherwise
pub fn subtitle_codec(req: &TranscodeRequest) -> &'static str {
    if req.converts_subtitles() {
        SRT_CODEC
    } else {
        COPY_CODEC
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Preset, Quality};
    use proptest::prelude::*;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(&HvecConfig::default())
    }

    fn request(mode: Mode, output: &str, subs: Option<&str>) -> TranscodeRequest {
        let mut req = TranscodeRequest::new("movie.mp4", Some(PathBuf::from(output)));
        req.mode = mode;
        req.subtitles = subs.map(PathBuf::from);
        req
    }

    fn codec_for(cmd: &ToolCommand, selector: &str) -> Vec<String> {
        cmd.args
            .windows(2)
            .filter(|w| w[0] == selector)
            .map(|w| w[1].clone())
            .collect()
    }

    #[test]
    fn test_transcode_command_layout() {
        let req = request(Mode::Transcode, "movie.mkv", None);
        let cmd = builder().build(&req);

        assert_eq!(cmd.program, PathBuf::from("ffmpeg"));
        assert_eq!(
            cmd.args,
            vec![
                "-hwaccel", "qsv",
                "-i", "movie.mp4",
                "-map", "0:v:0", "-map", "0:a?", "-map", "0:s?",
                "-c:v", "hevc_qsv", "-preset", "medium", "-global_quality", "24",
                "-c:a", "copy",
                "-c:s", "srt",
                "movie.mkv",
            ]
        );
    }

    #[test]
    fn test_remux_with_external_subtitles_layout() {
        let req = request(Mode::Remux, "movie.mp4", Some("movie.en.srt"));
        let cmd = builder().build(&req);

        assert_eq!(
            cmd.args,
            vec![
                "-i", "movie.mp4",
                "-i", "movie.en.srt",
                "-map", "0:v:0", "-map", "0:a?", "-map", "1:s",
                "-metadata:s:s:0", "language=eng",
                "-c:v", "copy",
                "-c:a", "copy",
                "-c:s", "copy",
                "movie.mp4",
            ]
        );
    }

    #[test]
    fn test_audio_reencode_with_bitrate() {
        let mut req = request(Mode::Transcode, "out.mp4", None);
        req.audio_codec = "aac".to_string();
        req.audio_bitrate = Some("192k".to_string());
        let cmd = builder().build(&req);

        assert!(cmd.has_pair("-c:a", "aac"));
        assert!(cmd.has_pair("-b:a", "192k"));
    }

    #[test]
    fn test_bitrate_ignored_for_copy() {
        let mut req = request(Mode::Transcode, "out.mp4", None);
        req.audio_bitrate = Some("192k".to_string());
        let cmd = builder().build(&req);

        assert!(cmd.has_pair("-c:a", "copy"));
        assert!(!cmd.args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_reduced_noise_uses_stats_period() {
        let mut req = request(Mode::Remux, "out.mkv", None);
        req.reduced_noise = true;
        let cmd = builder().build(&req);

        assert_eq!(&cmd.args[..2], &["-stats_period", "30"]);
        assert!(!cmd.args.contains(&"-loglevel".to_string()));
    }

    #[test]
    fn test_overwrite_flag() {
        let mut req = request(Mode::Remux, "out.mkv", None);
        req.overwrite = true;
        assert_eq!(builder().build(&req).args[0], "-y");
    }

    #[test]
    fn test_custom_encoder_from_config() {
        let cfg = HvecConfig {
            hwaccel: "vaapi".to_string(),
            video_encoder: "hevc_vaapi".to_string(),
            ffmpeg_bin: PathBuf::from("/opt/ffmpeg"),
            ..Default::default()
        };
        let cmd = CommandBuilder::new(&cfg).build(&request(Mode::Transcode, "out.mkv", None));

        assert_eq!(cmd.program, PathBuf::from("/opt/ffmpeg"));
        assert!(cmd.has_pair("-hwaccel", "vaapi"));
        assert!(cmd.has_pair("-c:v", "hevc_vaapi"));
    }

    #[test]
    fn test_display_quotes_paths_with_spaces() {
        let req = TranscodeRequest::new("My Movie.mp4", None);
        let rendered = builder().build(&req).to_string();

        assert!(rendered.starts_with("ffmpeg -hwaccel qsv -i \"My Movie.mp4\""));
        assert!(rendered.ends_with("\"My Movie.mkv\""));
    }

    fn any_request() -> impl Strategy<Value = TranscodeRequest> {
        (
            prop_oneof![Just(Mode::Transcode), Just(Mode::Remux)],
            prop_oneof![Just("out.mkv"), Just("out.MKV"), Just("out.mp4"), Just("out.mov")],
            prop::option::of(Just("subs.srt")),
            1u8..=51,
            0usize..7,
            prop_oneof![Just("copy"), Just("aac"), Just("ac3")],
            (prop::bool::ANY, prop::bool::ANY, prop::bool::ANY, prop::bool::ANY),
        )
            .prop_map(|(mode, output, subs, quality, preset, audio, (quiet, noise, convert, overwrite))| {
                let mut req = request(mode, output, subs);
                req.quality = Quality::new(quality).unwrap();
                req.preset = Preset::ALL[preset];
                req.audio_codec = audio.to_string();
                req.audio_bitrate = Some("160k".to_string());
                req.quiet = quiet;
                req.reduced_noise = noise;
                req.convert_subtitles = convert;
                req.overwrite = overwrite;
                req
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// **Property 1: Remux only copies**
        ///
        /// A remux without external subtitles never re-encodes video or audio
        #[test]
        fn test_remux_never_reencodes(req in any_request()) {
            let mut req = req;
            req.mode = Mode::Remux;
            req.subtitles = None;
            let cmd = builder().build(&req);

            prop_assert_eq!(codec_for(&cmd, "-c:v"), vec!["copy".to_string()]);
            prop_assert_eq!(codec_for(&cmd, "-c:a"), vec!["copy".to_string()]);
            prop_assert!(!cmd.args.contains(&"-hwaccel".to_string()));
            prop_assert!(!cmd.args.contains(&"-b:a".to_string()));
        }

        /// **Property 2: Transcode uses the hardware HEVC encoder**
        ///
        /// The encoder, quality and preset always appear, and no decoder is
        /// forced ahead of the input.
        #[test]
        fn test_transcode_uses_hevc_encoder(req in any_request()) {
            let mut req = req;
            req.mode = Mode::Transcode;
            let cmd = builder().build(&req);

            prop_assert_eq!(codec_for(&cmd, "-c:v"), vec!["hevc_qsv".to_string()]);
            prop_assert!(cmd.has_pair("-global_quality", &req.quality.to_string()));
            prop_assert!(cmd.has_pair("-preset", req.preset.as_str()));

            let first_input = cmd.args.iter().position(|a| a == "-i").unwrap();
            prop_assert!(!cmd.args[..first_input].contains(&"-c:v".to_string()));
            prop_assert!(cmd.has_pair("-hwaccel", "qsv"));
        }

        /// **Property 3: Subtitle codec rule**
        ///
        /// Matroska output or an explicit conversion request yields SRT in any mode
        #[test]
        fn test_subtitle_codec_rule(req in any_request()) {
            let cmd = builder().build(&req);
            let is_mkv = req.output.to_string_lossy().to_lowercase().ends_with(".mkv");
            let expected = if is_mkv || req.convert_subtitles { "srt" } else { "copy" };

            prop_assert_eq!(codec_for(&cmd, "-c:s"), vec![expected.to_string()]);
        }

        /// **Property 4: Quiet wins over reduced noise**
        #[test]
        fn test_quiet_precedence(req in any_request()) {
            let mut req = req;
            req.quiet = true;
            req.reduced_noise = true;
            let cmd = builder().build(&req);

            prop_assert!(cmd.has_pair("-loglevel", "error"));
            prop_assert!(!cmd.args.contains(&"-stats_period".to_string()));
        }

        /// **Property 5: External subtitles come from the second input**
        #[test]
        fn test_external_subtitles_mapped_from_second_input(req in any_request()) {
            let mut req = req;
            req.subtitles = Some(PathBuf::from("subs.srt"));
            let cmd = builder().build(&req);
            let maps = codec_for(&cmd, "-map");

            prop_assert!(maps.contains(&"1:s".to_string()));
            prop_assert!(!maps.iter().any(|m| m.starts_with("0:s")));
            prop_assert_eq!(cmd.args.iter().filter(|a| *a == "-i").count(), 2);
        }

        /// **Property 6: Output path is always the final argument**
        #[test]
        fn test_output_last(req in any_request()) {
            let cmd = builder().build(&req);
            let output = req.output.to_string_lossy().to_string();
            prop_assert_eq!(cmd.last_arg(), Some(output.as_str()));
        }
    }
}
