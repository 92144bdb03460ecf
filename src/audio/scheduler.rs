use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pitch::PitchShifter;
use crate::speakers::{ScriptEntry, SpeakerRegistry};
use crate::{Error, Result, SpeechEngine};

/// How script entries are scheduled onto the speech engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One entry at a time, in script order.
    Sequential,
    /// A bounded worker pool; completion order is unconstrained.
    #[default]
    Concurrent,
}

/// A script entry that made it to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEntry {
    pub sequence_index: usize,
    pub speaker: String,
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// A script entry that produced no file, and why.
#[derive(Debug)]
pub struct EntryFailure {
    pub sequence_index: usize,
    pub speaker: String,
    pub error: Error,
}

/// Per-entry outcomes of one synthesis pass, in script order.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    pub outcomes: Vec<std::result::Result<RenderedEntry, EntryFailure>>,
}

impl SynthesisReport {
    pub fn rendered(&self) -> impl Iterator<Item = &RenderedEntry> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryFailure> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

/// Output file name: index zero-padded to the width of the entry count.
pub fn entry_file_name(sequence_index: usize, speaker: &str, total_entries: usize) -> String {
    let width = total_entries.max(1).to_string().len();
    format!("{sequence_index:0width$}_{}.wav", sanitize_filename(speaker))
}

fn sanitize_filename(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    INVALID
        .get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid filename regex"))
        .replace_all(name, "_")
        .into_owned()
}

/// Renders every script entry: synthesize, pitch shift, write.
pub struct SynthesisScheduler<'a> {
    engine: &'a dyn SpeechEngine,
    shifter: PitchShifter,
    audio_dir: PathBuf,
    workers: usize,
}

impl<'a> SynthesisScheduler<'a> {
    pub fn new(engine: &'a dyn SpeechEngine, audio_dir: &Path) -> Self {
        Self {
            engine,
            shifter: PitchShifter::default(),
            audio_dir: audio_dir.to_path_buf(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    pub fn with_pitch_shifter(mut self, shifter: PitchShifter) -> Self {
        self.shifter = shifter;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Render the whole script.
    ///
    /// Only an engine that is unavailable up front fails the run; every
    /// other problem is recorded against its entry and the batch goes on.
    pub fn run(&self, registry: &SpeakerRegistry, mode: ExecutionMode) -> Result<SynthesisReport> {
        self.engine
            .check_available()
            .map_err(|e| Error::EngineUnavailable(e.to_string()))?;

        let script = registry.script();
        log::info!(
            "Synthesizing {} entries ({mode:?}, {} workers)",
            script.len(),
            if mode == ExecutionMode::Sequential { 1 } else { self.workers }
        );

        let outcomes: Vec<_> = match mode {
            ExecutionMode::Sequential => script
                .iter()
                .map(|entry| self.render_entry(entry, registry, script.len()))
                .collect(),
            ExecutionMode::Concurrent => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.workers)
                    .thread_name(|i| format!("synth-{i}"))
                    .build()?;
                // Collecting an indexed parallel iterator keeps script order
                // no matter which worker finishes first.
                pool.install(|| {
                    script
                        .par_iter()
                        .map(|entry| self.render_entry(entry, registry, script.len()))
                        .collect()
                })
            }
        };

        let report = SynthesisReport { outcomes };
        let failed = report.failures().count();
        if failed > 0 {
            log::warn!("{failed} of {} entries produced no audio", script.len());
        }
        Ok(report)
    }

    fn render_entry(
        &self,
        entry: &ScriptEntry,
        registry: &SpeakerRegistry,
        total_entries: usize,
    ) -> std::result::Result<RenderedEntry, EntryFailure> {
        self.try_render_entry(entry, registry, total_entries)
            .map_err(|error| {
                log::error!(
                    "Error processing audio for entry {}: {error}",
                    entry.sequence_index
                );
                EntryFailure {
                    sequence_index: entry.sequence_index,
                    speaker: entry.speaker_name.clone(),
                    error,
                }
            })
    }

    fn try_render_entry(
        &self,
        entry: &ScriptEntry,
        registry: &SpeakerRegistry,
        total_entries: usize,
    ) -> Result<RenderedEntry> {
        let speaker = registry
            .get_speaker(&entry.speaker_name)
            .ok_or_else(|| Error::UnknownSpeaker(entry.speaker_name.clone()))?;

        let raw = self.engine.synthesize(&entry.text)?;
        let shifted = self.shifter.shift_result(&raw, speaker.pitch_factor)?;

        let path = self.audio_dir.join(entry_file_name(
            entry.sequence_index,
            &speaker.name,
            total_entries,
        ));
        shifted.write_wav(&path)?;
        log::debug!(
            "Audio exported with pitch factor {:.3} to {}",
            speaker.pitch_factor,
            path.display()
        );

        Ok(RenderedEntry {
            sequence_index: entry.sequence_index,
            speaker: speaker.name.clone(),
            path,
            duration_secs: shifted.duration_secs(),
        })
    }
}
