use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use superreader::audio::ExecutionMode;
use superreader::engines::espeak::{EspeakEngine, EspeakParams};
use superreader::narrative::AttributionMode;
use superreader::{Pipeline, PipelineConfig};

/// Turn a plain-text book into a multi-voice audiobook.
#[derive(Debug, Parser)]
#[command(name = "superreader", version, about)]
struct Cli {
    /// Input document (.txt)
    input: PathBuf,

    /// Render entries one at a time instead of on a worker pool
    #[arg(long)]
    sequential: bool,

    /// Alternate lines between two placeholder voices instead of detecting speakers
    #[arg(long)]
    alternate: bool,

    /// Worker threads for synthesis (defaults to available cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Silence between lines, in milliseconds
    #[arg(long, default_value_t = 300)]
    silence_ms: u32,

    /// Working directory for per-line audio (purged on every run)
    #[arg(long, default_value = "./audio")]
    audio_dir: PathBuf,

    /// Seed for reproducible pitch factors
    #[arg(long)]
    seed: Option<u64>,

    /// JSON name table used to guess speaker genders
    #[arg(long)]
    names: Option<PathBuf>,

    /// espeak-ng voice
    #[arg(long, default_value = "en-us")]
    voice: String,

    /// Speaking rate in words per minute
    #[arg(long, default_value_t = 165)]
    wpm: u32,

    /// Path to a bundled espeak-ng binary
    #[arg(long, env = "ESPEAK_NG_BIN")]
    espeak_bin: Option<PathBuf>,

    /// Path to bundled espeak-ng data
    #[arg(long, env = "ESPEAK_DATA_PATH")]
    espeak_data: Option<PathBuf>,

    /// Attribute speakers and write the JSONL record without synthesizing
    #[arg(long)]
    dry_run: bool,
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, superreader::config::PipelineConfigBuilderError> {
    let mut builder = PipelineConfig::builder();
    builder
        .audio_dir(cli.audio_dir.clone())
        .silence_ms(cli.silence_ms)
        .dry_run(cli.dry_run)
        .execution(if cli.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        })
        .attribution(if cli.alternate {
            AttributionMode::Alternating
        } else {
            AttributionMode::Heuristic
        });
    if let Some(workers) = cli.workers {
        builder.workers(workers);
    }
    if let Some(seed) = cli.seed {
        builder.seed(seed);
    }
    if let Some(names) = &cli.names {
        builder.name_table(names.clone());
    }
    builder.build()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let engine = EspeakEngine::with_espeak(cli.espeak_bin.clone(), cli.espeak_data.clone())
        .with_params(EspeakParams {
            voice: cli.voice.clone(),
            words_per_minute: cli.wpm,
            ..Default::default()
        });

    let pipeline = Pipeline::new(config, &engine);
    let result = pipeline.run(&cli.input);
    match result {
        Ok(summary) => {
            log::info!(
                "{} speakers, {} script entries, {} rendered, {} failed",
                summary.speakers,
                summary.entries,
                summary.synthesis.rendered().count(),
                summary.synthesis.failures().count()
            );
            if let Some(assembly) = &summary.assembly {
                log::info!(
                    "Processing complete! Saved combined file at {} ({:.1}s)",
                    assembly.output.display(),
                    assembly.duration_secs
                );
            }
            log::info!("Speaker record written to {}", summary.jsonl.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
