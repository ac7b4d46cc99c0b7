use std::fs;
use std::path::{Path, PathBuf};
use humansize::{format_size, DECIMAL};
use log::{debug, info, warn};
use crate::command::{CommandBuilder, ToolCommand};
use crate::config::HvecConfig;
use crate::error::{HvecError, Result};
use crate::estimate::{DurationEstimator, Estimate};
use crate::ffprobe::{self, probe_file};
use crate::request::{Mode, TranscodeRequest};
use crate::runner::ProcessRunner;

const RULE: &str = "-----------------------------------------------------------------";

/// What happened to a single request
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Command printed, nothing spawned
    DryRun(ToolCommand),
    /// Input left untouched
    Skipped { reason: String },
    Completed { output: PathBuf, source_deleted: bool },
}

/// Runs one request end to end: validation, optional skip check and
/// estimate, the ffmpeg invocation, and source cleanup.
pub struct Job<'a, R: ProcessRunner> {
    cfg: &'a HvecConfig,
    runner: &'a R,
    builder: CommandBuilder,
    estimator: DurationEstimator,
}

impl<'a, R: ProcessRunner> Job<'a, R> {
    pub fn new(cfg: &'a HvecConfig, runner: &'a R) -> Self {
        Job {
            cfg,
            runner,
            builder: CommandBuilder::new(cfg),
            estimator: DurationEstimator::new(cfg.estimated_fps),
        }
    }

    /// Check input and subtitle paths before anything is spawned
    pub fn validate(req: &TranscodeRequest) -> Result<()> {
        if !req.input.is_file() {
            return Err(HvecError::InputNotFound(req.input.clone()));
        }
        if let Some(subs) = &req.subtitles {
            if !subs.is_file() {
                return Err(HvecError::SubtitleNotFound(subs.clone()));
            }
        }
        Ok(())
    }

    pub async fn run(&self, req: &TranscodeRequest) -> Result<JobOutcome> {
        Self::validate(req)?;

        if req.mode == Mode::Remux && !req.audio_codec.eq_ignore_ascii_case("copy") {
            warn!("Audio codec '{}' ignored: remux copies every stream", req.audio_codec);
        }
        if req.subtitles.is_some() {
            println!("Subtitle file provided. Building command to embed subtitles...");
        }

        let cmd = self.builder.build(req);

        if req.dry_run {
            println!("\nDry run, FFmpeg command would be:");
            println!("{}", cmd);
            return Ok(JobOutcome::DryRun(cmd));
        }

        if req.skip_hevc {
            match probe_file(self.runner, self.cfg, &req.input).await {
                Ok(meta) if meta.is_hevc() => {
                    let reason = format!("{} is already HEVC", req.input.display());
                    info!("Skipping: {}", reason);
                    return Ok(JobOutcome::Skipped { reason });
                }
                Ok(meta) => debug!(
                    "Source codec {:?}, continuing",
                    meta.video_codec().unwrap_or_default()
                ),
                Err(e) => warn!("Could not check codec of {}: {}", req.input.display(), e),
            }
        }

        if req.mode == Mode::Transcode && !req.quiet {
            self.print_estimate(&req.input).await;
        }

        println!("\nExecuting FFmpeg command:");
        println!("{}", cmd);
        println!("\n------------------------- FFmpeg Output -------------------------");

        let result = self.runner.run(&cmd).await;
        println!("{}", RULE);
        result?;

        println!("\nSuccessfully created '{}'.", req.output.display());

        let source_deleted = if req.delete_source {
            delete_source(&req.input, &req.output)?
        } else {
            false
        };

        Ok(JobOutcome::Completed {
            output: req.output.clone(),
            source_deleted,
        })
    }

    /// Print the ffprobe stream summary for `input` followed by an estimate
    pub async fn info(&self, input: &Path) -> Result<()> {
        if !input.is_file() {
            return Err(HvecError::InputNotFound(input.to_path_buf()));
        }

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.display().to_string());
        println!("\n--- Media Information for: {} ---\n", name);

        self.runner.run(&ffprobe::info_command(self.cfg, input)).await?;
        self.print_estimate(input).await;
        Ok(())
    }

    /// Probe `input` and estimate encode time; probe failures become `Unknown`
    pub async fn estimate(&self, input: &Path) -> Estimate {
        match probe_file(self.runner, self.cfg, input).await {
            Ok(meta) => self.estimator.estimate(&meta),
            Err(e) => Estimate::Unknown(e.to_string()),
        }
    }

    async fn print_estimate(&self, input: &Path) {
        println!("\n--- Transcode Estimate (for this hardware) ---");
        if let Ok(meta) = fs::metadata(input) {
            println!("Input size: {}", format_size(meta.len(), DECIMAL));
        }

        let estimate = self.estimate(input).await;
        match &estimate {
            Estimate::Known { total_frames, .. } => {
                debug!("{} frames at {} fps", total_frames, self.estimator.assumed_fps());
                println!("Estimated time to transcode: {}", estimate.render());
                println!(
                    "(Based on an estimated {} FPS for HEVC encoding on this hardware)",
                    self.estimator.assumed_fps()
                );
            }
            Estimate::Unknown(reason) => {
                println!("Could not analyze video to provide an estimate: {}", reason);
            }
        }
    }
}

/// Remove the source after a successful run; never removes the output itself
fn delete_source(input: &Path, output: &Path) -> Result<bool> {
    let same_file = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same_file {
        warn!("Not deleting {}: it is also the output", input.display());
        return Ok(false);
    }

    fs::remove_file(input)?;
    info!("Deleted source {}", input.display());
    Ok(true)
}
