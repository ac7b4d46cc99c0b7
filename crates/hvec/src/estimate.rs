use std::fmt::Display;
use crate::ffprobe::FFProbeData;

/// Outcome of a transcode time estimate
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate {
    Known { total_frames: u64, seconds: f64 },
    /// No estimate could be made; carries the reason
    Unknown(String),
}

impl Estimate {
    /// `HH:MM:SS`, or `unknown`
    pub fn render(&self) -> String {
        match self {
            Estimate::Known { seconds, .. } => format_hms(*seconds),
            Estimate::Unknown(_) => "unknown".to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Estimate::Known { .. })
    }
}

impl Display for Estimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Estimates wall-clock encode time from probe metadata at a fixed throughput
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimator {
    assumed_fps: f64,
}

impl DurationEstimator {
    pub fn new(assumed_fps: f64) -> Self {
        DurationEstimator { assumed_fps }
    }

    pub fn assumed_fps(&self) -> f64 {
        self.assumed_fps
    }

    pub fn estimate(&self, meta: &FFProbeData) -> Estimate {
        let Some(video) = meta.video_stream() else {
            return Estimate::Unknown("could not find a video stream to analyze".to_string());
        };

        let total_frames = match video.nb_frames.as_deref().and_then(parse_frame_count) {
            Some(frames) => frames as f64,
            None => {
                let duration = [video.duration.as_deref(), meta.format.duration.as_deref()]
                    .into_iter()
                    .flatten()
                    .find_map(|d| d.trim().parse::<f64>().ok())
                    .unwrap_or(0.0);

                let rate = video.avg_frame_rate.as_deref().unwrap_or("0/1");
                let (num, den) = match parse_rational(rate) {
                    Some(r) => r,
                    None => return Estimate::Unknown(format!("unparsable frame rate '{}'", rate)),
                };
                if den == 0 {
                    return Estimate::Unknown(format!("frame rate '{}' has a zero denominator", rate));
                }
                (duration * (num as f64 / den as f64)).ceil()
            }
        };

        if !(total_frames > 0.0) || !(self.assumed_fps > 0.0) {
            return Estimate::Unknown("could not determine video length".to_string());
        }

        Estimate::Known {
            total_frames: total_frames as u64,
            seconds: total_frames / self.assumed_fps,
        }
    }
}

fn parse_frame_count(s: &str) -> Option<u64> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn parse_rational(s: &str) -> Option<(i64, i64)> {
    let (num, den) = s.trim().split_once('/')?;
    Some((num.trim().parse().ok()?, den.trim().parse().ok()?))
}

/// Format seconds as zero-padded `HH:MM:SS`, truncating fractions
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let (mins, secs) = (total / 60, total % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
