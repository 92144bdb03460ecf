use std::fs;
use std::path::{Path, PathBuf};

use super::read_wav;
use crate::{Error, Result, SynthesisResult};

/// Gap inserted between consecutive lines of the audiobook.
pub const DELAY_BETWEEN_LINES_MS: u32 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub output: PathBuf,
    pub entries: usize,
    pub skipped: Vec<PathBuf>,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

/// Make sure `dir` exists and holds nothing from a previous run.
///
/// A file that cannot be removed is logged and left behind.
pub fn clear_audio_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        log::info!("Directory '{}' created", dir.display());
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("Deleted file: {}", path.display()),
            Err(e) => log::error!("Error deleting file {}: {e}", path.display()),
        }
    }
    Ok(())
}

/// `.wav` files in `dir`, sorted by file name.
fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if path.is_file() && is_wav {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Join every WAV in `dir` into `output`, in file-name order, with
/// `silence_ms` of silence between consecutive entries.
///
/// Unreadable files, and files at a different sample rate than the first
/// one, are skipped.
pub fn combine_audio_files(dir: &Path, output: &Path, silence_ms: u32) -> Result<AssemblyReport> {
    let mut combined: Option<SynthesisResult> = None;
    let mut entries = 0;
    let mut skipped = Vec::new();

    for path in wav_files(dir)? {
        let audio = match read_wav(&path) {
            Ok(audio) => audio,
            Err(e) => {
                log::warn!("Skipping unreadable audio {}: {e}", path.display());
                skipped.push(path);
                continue;
            }
        };

        match combined.as_mut() {
            None => combined = Some(audio),
            Some(acc) if acc.sample_rate != audio.sample_rate => {
                log::warn!(
                    "Skipping {}: sample rate {}Hz does not match {}Hz",
                    path.display(),
                    audio.sample_rate,
                    acc.sample_rate
                );
                skipped.push(path);
                continue;
            }
            Some(acc) => {
                let gap = (acc.sample_rate as u64 * silence_ms as u64 / 1000) as usize;
                acc.samples.resize(acc.samples.len() + gap, 0.0);
                acc.samples.extend_from_slice(&audio.samples);
            }
        }
        entries += 1;
    }

    let combined = combined.ok_or_else(|| Error::NothingToAssemble(dir.to_path_buf()))?;
    combined.write_wav(output)?;
    log::info!("Combined audio file saved as '{}'", output.display());

    Ok(AssemblyReport {
        output: output.to_path_buf(),
        entries,
        skipped,
        sample_rate: combined.sample_rate,
        duration_secs: combined.duration_secs(),
    })
}
