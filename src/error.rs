use std::path::PathBuf;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Resampler setup failed: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),
    #[error("Resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
    #[error("FFT error: {0}")]
    Fft(#[from] realfft::FftError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("No speaker data found for {0}")]
    UnknownSpeaker(String),
    #[error("No audio files to assemble in {}", .0.display())]
    NothingToAssemble(PathBuf),
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("Annotation failed: {0}")]
    Annotation(String),
    #[error("Invalid name table: {0}")]
    NameTable(String),
}
