pub mod config;
pub mod error;
pub mod request;
pub mod command;
pub mod ffprobe;
pub mod estimate;
pub mod runner;
pub mod job;
pub mod scan;

pub use config::HvecConfig;
pub use error::HvecError;
pub use request::{Mode, Preset, Quality, TranscodeRequest};
pub use command::{CommandBuilder, ToolCommand};
pub use estimate::{DurationEstimator, Estimate};
pub use runner::{ProcessRunner, SystemRunner};
pub use job::{Job, JobOutcome};
