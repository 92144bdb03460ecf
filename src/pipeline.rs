//! End-to-end driver: document in, audiobook and JSONL record out.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::attribution::{Annotator, LexicalAnnotator};
use crate::audio::{
    clear_audio_directory, combine_audio_files, AssemblyReport, PitchShifter, SynthesisReport,
    SynthesisScheduler,
};
use crate::config::PipelineConfig;
use crate::gender::{backfill_genders, NameTable};
use crate::ingest::read_document;
use crate::narrative::NarrativeProcessor;
use crate::output::write_jsonl;
use crate::{Error, Result, SpeakerRegistry, SpeechEngine};

#[derive(Debug, Default, Clone, Copy)]
pub struct Timings {
    pub load: Duration,
    pub attribution: Duration,
    pub audio: Duration,
}

#[derive(Debug)]
pub struct RunSummary {
    pub speakers: usize,
    pub entries: usize,
    pub jsonl: PathBuf,
    pub synthesis: SynthesisReport,
    /// `None` on a dry run or when no entry rendered.
    pub assembly: Option<AssemblyReport>,
    pub timings: Timings,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    engine: &'a dyn SpeechEngine,
    annotator: Box<dyn Annotator + 'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig, engine: &'a dyn SpeechEngine) -> Self {
        Self {
            config,
            engine,
            annotator: Box::new(LexicalAnnotator::new()),
        }
    }

    /// Swap in a different annotator (e.g. a statistical tagger).
    pub fn with_annotator(mut self, annotator: impl Annotator + 'a) -> Self {
        self.annotator = Box::new(annotator);
        self
    }

    fn registry(&self) -> SpeakerRegistry {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SpeakerRegistry::with_rng(rng, self.config.pitch_range.clone())
    }

    /// Attribute speakers for `lines` and fill in genders.
    pub fn attribute<S: AsRef<str>>(&self, lines: &[S]) -> Result<SpeakerRegistry> {
        let mut registry = self.registry();
        NarrativeProcessor::new(self.annotator.as_ref()).process(
            lines,
            self.config.attribution,
            &mut registry,
        );

        let names = match &self.config.name_table {
            Some(path) => NameTable::load(path).unwrap_or_else(|e| {
                log::error!(
                    "Could not load name table {}: {e}; using built-in names",
                    path.display()
                );
                NameTable::default()
            }),
            None => NameTable::default(),
        };
        backfill_genders(&mut registry, &names);
        Ok(registry)
    }

    /// Synthesize every entry, then join the results.
    ///
    /// The audio directory must already be prepared. When no entry rendered
    /// there is nothing to join and the assembly is `None`.
    pub fn render(
        &self,
        registry: &SpeakerRegistry,
        output: &Path,
    ) -> Result<(SynthesisReport, Option<AssemblyReport>)> {
        let synthesis = SynthesisScheduler::new(self.engine, &self.config.audio_dir)
            .with_pitch_shifter(PitchShifter::new(self.config.min_pitch_duration_secs))
            .with_workers(self.config.workers)
            .run(registry, self.config.execution)?;
        if synthesis.rendered().next().is_none() {
            log::warn!(
                "No entries were rendered, skipping {}",
                output.display()
            );
            return Ok((synthesis, None));
        }
        // Every worker has finished once `run` returns.
        match combine_audio_files(&self.config.audio_dir, output, self.config.silence_ms) {
            Ok(assembly) => Ok((synthesis, Some(assembly))),
            Err(Error::NothingToAssemble(dir)) => {
                log::warn!("No readable audio in {}, skipping {}", dir.display(), output.display());
                Ok((synthesis, None))
            }
            Err(e) => Err(e),
        }
    }

    /// Run the whole book: ingest, attribute, record, synthesize, assemble.
    ///
    /// Outputs land next to the input as `<stem>.jsonl` and `<stem>.wav`.
    pub fn run(&self, input: &Path) -> Result<RunSummary> {
        let mut timings = Timings::default();

        clear_audio_directory(&self.config.audio_dir)?;

        let started = Instant::now();
        let lines = read_document(input)?;
        timings.load = started.elapsed();

        let started = Instant::now();
        let registry = self.attribute(&lines)?;
        timings.attribution = started.elapsed();

        let jsonl = input.with_extension("jsonl");
        write_jsonl(&registry, &jsonl)?;

        let (synthesis, assembly) = if self.config.dry_run {
            (SynthesisReport::default(), None)
        } else {
            let started = Instant::now();
            let rendered = self.render(&registry, &input.with_extension("wav"))?;
            timings.audio = started.elapsed();
            rendered
        };

        log::info!("Loading time: {:.2} seconds", timings.load.as_secs_f64());
        log::info!(
            "Processing time: {:.2} seconds",
            timings.attribution.as_secs_f64()
        );
        log::info!(
            "Audio generation time: {:.2} seconds",
            timings.audio.as_secs_f64()
        );

        Ok(RunSummary {
            speakers: registry.speakers().len(),
            entries: registry.script().len(),
            jsonl,
            synthesis,
            assembly,
            timings,
        })
    }
}
