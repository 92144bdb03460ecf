use std::ops::Range;
use std::path::PathBuf;

use derive_builder::Builder;

use crate::audio::assembler::DELAY_BETWEEN_LINES_MS;
use crate::audio::pitch::MIN_AUDIO_DURATION;
use crate::audio::ExecutionMode;
use crate::narrative::AttributionMode;
use crate::speakers::PITCH_FACTOR_RANGE;

/// Settings for one audiobook run.
///
/// ```rust
/// use superreader::{audio::ExecutionMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .execution(ExecutionMode::Sequential)
///     .silence_ms(500u32)
///     .seed(7u64)
///     .build()
///     .unwrap();
/// assert_eq!(config.silence_ms, 500);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default, setter(into), build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// Working directory for per-line audio; purged before every run.
    pub audio_dir: PathBuf,
    /// Silence between consecutive lines in the combined file.
    pub silence_ms: u32,
    /// Audio shorter than this (seconds) is not pitch shifted.
    pub min_pitch_duration_secs: f64,
    /// Range pitch factors are drawn from, upper bound exclusive.
    pub pitch_range: Range<f64>,
    /// Size of the synthesis worker pool.
    pub workers: usize,
    pub execution: ExecutionMode,
    pub attribution: AttributionMode,
    /// Fixed seed for reproducible pitch factors.
    #[builder(setter(into, strip_option))]
    pub seed: Option<u64>,
    /// JSON name table for gender lookup; the built-in table otherwise.
    #[builder(setter(into, strip_option))]
    pub name_table: Option<PathBuf>,
    /// Stop after attribution and the JSONL record; no audio.
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("./audio"),
            silence_ms: DELAY_BETWEEN_LINES_MS,
            min_pitch_duration_secs: MIN_AUDIO_DURATION,
            pitch_range: PITCH_FACTOR_RANGE,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            execution: ExecutionMode::default(),
            attribution: AttributionMode::default(),
            seed: None,
            name_table: None,
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(range) = &self.pitch_range {
            if !(range.start > 0.0 && range.start < range.end) {
                return Err(format!(
                    "pitch range must be positive and non-empty, got {range:?}"
                ));
            }
        }
        if self.workers == Some(0) {
            return Err("worker count must be at least 1".to_string());
        }
        if let Some(secs) = self.min_pitch_duration_secs {
            if secs < 0.0 {
                return Err(format!("minimum pitch duration must not be negative, got {secs}"));
            }
        }
        Ok(())
    }
}
