//! Audio post-processing: pitch shifting, synthesis scheduling and final
//! assembly, plus the WAV helpers they share.

pub mod assembler;
pub mod pitch;
pub mod scheduler;

use std::path::Path;

use crate::{Error, Result, SynthesisResult};

pub use assembler::{clear_audio_directory, combine_audio_files, AssemblyReport};
pub use pitch::{PitchShifter, MIN_AUDIO_DURATION};
pub use scheduler::{EntryFailure, ExecutionMode, RenderedEntry, SynthesisReport, SynthesisScheduler};

/// Read a WAV file as mono f32 samples in [-1, 1].
///
/// 16, 24 and 32-bit integer and 32-bit float files are accepted;
/// multi-channel audio is averaged down to mono.
pub fn read_wav(path: &Path) -> Result<SynthesisResult> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (hound::SampleFormat::Int, 24) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (format, bits) => {
            log::warn!("{}: unsupported format {format:?} {bits}bit", path.display());
            return Err(Error::Wav(hound::Error::Unsupported));
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}
