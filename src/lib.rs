//! # superreader
//!
//! Turn a block of prose into a multi-voice audiobook.
//!
//! ## Features
//!
//! - **Speaker attribution**: narration and quoted dialogue are split apart
//!   and each quote is credited to a named character, the last known
//!   speaker, or a placeholder voice
//! - **Per-speaker pitch**: every speaker gets a fixed random pitch factor,
//!   applied after synthesis without changing duration
//! - **Parallel synthesis**: script lines render on a bounded worker pool or
//!   strictly in order, with identical output files
//! - **Assembly**: per-line WAV files are joined with a fixed gap of silence
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use superreader::{engines::espeak::EspeakEngine, Pipeline, PipelineConfig};
//!
//! let engine = EspeakEngine::new();
//! let pipeline = Pipeline::new(PipelineConfig::default(), &engine);
//! let summary = pipeline.run(Path::new("little_women.txt"))?;
//! println!("{} lines voiced", summary.synthesis.rendered().count());
//! # Ok::<(), superreader::Error>(())
//! ```

pub mod attribution;
pub mod audio;
pub mod config;
pub mod engines;
pub mod error;
pub mod gender;
pub mod ingest;
pub mod narrative;
pub mod output;
pub mod pipeline;
pub mod speakers;

use std::path::Path;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunSummary};
pub use speakers::{Gender, Number, ScriptEntry, Speaker, SpeakerRegistry};

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw mono audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech engines.
///
/// Voice is fixed per engine; speakers are told apart by pitch alone,
/// which is applied after synthesis. Engines are shared by every worker
/// of the synthesis pool, so `synthesize` takes `&self`. An engine that is
/// not reentrant must serialise its own calls.
pub trait SpeechEngine: Send + Sync {
    /// Fail fast if the engine cannot synthesize at all.
    fn check_available(&self) -> Result<()>;

    /// Synthesize speech from the given text.
    fn synthesize(&self, text: &str) -> Result<SynthesisResult>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(&self, text: &str, wav_path: &Path) -> Result<()> {
        self.synthesize(text)?.write_wav(wav_path)
    }
}
