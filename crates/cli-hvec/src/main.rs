use anyhow::{Context, Result};
use clap::Parser;
use hvec::{
    config::HvecConfig,
    scan, HvecError, Job, JobOutcome, Mode, Preset, Quality, SystemRunner, TranscodeRequest,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

/// Transcodes a video to HEVC on the hardware encoder, remuxes it, or displays media info.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  \
        # Get info and estimated transcode time for a video\n  \
        hvec -i movie.mp4 --info\n\n  \
        # Transcode a video (writes movie.mkv)\n  \
        hvec -i movie.mp4\n\n  \
        # Remux with an external subtitle track\n  \
        hvec -i movie.mp4 -o movie.mkv --remux -s movie.en.srt"
)]
struct Args {
    /// Input video file, or a directory with --recursive
    #[arg(short, long)]
    input: PathBuf,

    /// Output file; defaults to the input with a .mkv extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy streams into the new container instead of re-encoding
    #[arg(long)]
    remux: bool,

    /// Subtitle file to embed
    #[arg(short, long)]
    subs: Option<PathBuf>,

    /// Encoder global quality, 1-51 (lower is better) [default: 24]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=51))]
    quality: Option<u8>,

    /// Encoder preset: veryfast, faster, fast, medium, slow, slower, veryslow [default: medium]
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Audio codec; anything other than "copy" re-encodes when transcoding
    #[arg(long, default_value = "copy")]
    audio_codec: String,

    /// Audio bitrate for re-encoded audio, e.g. 192k
    #[arg(long)]
    audio_bitrate: Option<String>,

    /// Delete the input after a successful run
    #[arg(long)]
    delete_source: bool,

    /// Process every media file under the input directory
    #[arg(short, long)]
    recursive: bool,

    /// Skip inputs whose video is already HEVC
    #[arg(long)]
    skip_hevc: bool,

    /// Only show errors from FFmpeg (wins over --less-noise)
    #[arg(short, long)]
    quiet: bool,

    /// Print FFmpeg progress every 30 seconds instead of continuously
    #[arg(long)]
    less_noise: bool,

    /// Convert subtitles to SRT even when the output isn't MKV
    #[arg(long)]
    convert_subs: bool,

    /// Print the FFmpeg command without running anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Overwrite the output file if it exists
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// Show media information and an estimated transcode time, then exit
    #[arg(long)]
    info: bool,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Options shared by every request built from one invocation
struct RequestTemplate {
    mode: Mode,
    subtitles: Option<PathBuf>,
    quality: Quality,
    preset: Preset,
}

impl Args {
    fn template(&self, cfg: &HvecConfig) -> Result<RequestTemplate> {
        let quality = Quality::new(self.quality.unwrap_or(cfg.default_quality))?;
        Ok(RequestTemplate {
            mode: if self.remux { Mode::Remux } else { Mode::Transcode },
            subtitles: self.subs.clone(),
            quality,
            preset: self.preset.unwrap_or(cfg.default_preset),
        })
    }

    fn request(&self, template: &RequestTemplate, input: PathBuf, output: Option<PathBuf>) -> TranscodeRequest {
        TranscodeRequest {
            mode: template.mode,
            subtitles: template.subtitles.clone(),
            quality: template.quality,
            preset: template.preset,
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            delete_source: self.delete_source,
            recursive: self.recursive,
            skip_hevc: self.skip_hevc,
            quiet: self.quiet,
            reduced_noise: self.less_noise,
            convert_subtitles: self.convert_subs,
            dry_run: self.dry_run,
            overwrite: self.overwrite,
            ..TranscodeRequest::new(input, output)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nError: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let cfg = HvecConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    println!("--- hvec Transcoder v{} ---", env!("CARGO_PKG_VERSION"));

    let runner = SystemRunner::new();
    let job = Job::new(&cfg, &runner);

    if args.info {
        job.info(&args.input).await?;
        return Ok(());
    }

    let template = args.template(&cfg)?;

    if args.input.is_dir() {
        if !args.recursive {
            anyhow::bail!("{} is a directory; pass --recursive to process its contents", args.input.display());
        }
        if args.output.is_some() {
            anyhow::bail!("--output cannot be used with a directory input");
        }
        if args.subs.is_some() {
            anyhow::bail!("--subs cannot be used with a directory input");
        }
        return run_batch(&args, &cfg, &job, &template).await;
    }

    let req = args.request(&template, args.input.clone(), args.output.clone());
    report(job.run(&req).await?);
    Ok(())
}

async fn run_batch(
    args: &Args,
    cfg: &HvecConfig,
    job: &Job<'_, SystemRunner>,
    template: &RequestTemplate,
) -> Result<()> {
    let files = scan::collect_media_files(&args.input, &cfg.media_extensions)
        .with_context(|| format!("Failed to scan {}", args.input.display()))?;

    if files.is_empty() {
        warn!("No media files found under {}", args.input.display());
        return Ok(());
    }

    let total = files.len();
    let mut failed = 0;

    for (n, file) in files.into_iter().enumerate() {
        println!("\n=== [{}/{}] {} ===", n + 1, total, file.display());
        let req = args.request(template, file, None);

        match job.run(&req).await {
            Ok(outcome) => report(outcome),
            Err(HvecError::ToolNotFound(tool)) => {
                // Every remaining file would fail the same way
                return Err(HvecError::ToolNotFound(tool).into());
            }
            Err(e) => {
                error!("{}: {}", req.input.display(), e);
                failed += 1;
            }
        }
    }

    info!("Batch complete: {} of {} files succeeded", total - failed, total);
    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, total);
    }
    Ok(())
}

fn report(outcome: JobOutcome) {
    match outcome {
        JobOutcome::DryRun(_) => {}
        JobOutcome::Skipped { reason } => println!("Skipped: {}", reason),
        JobOutcome::Completed { source_deleted: true, output } => {
            println!("Source deleted; kept '{}'.", output.display())
        }
        JobOutcome::Completed { .. } => {}
    }
}
