//! tts-batch - Synthesize speaker-turn text files into size-bounded WAV files

mod audio;
mod batch;
mod character;
mod config;
mod error;
mod progress;
mod text;
mod tts;

use anyhow::{Context, Result};
use batch::probe::{self, LimitSearch};
use batch::BatchDriver;
use character::{CharacterMap, VoiceSelection};
use clap::{Parser, Subcommand};
use config::{BatchConfig, TtsBatchConfig};
use env_logger::Env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tts::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "tts-batch")]
#[command(about = "Synthesize speaker-turn text files into size-bounded WAV files", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    /// Hide progress bars
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize every `<index>_<Name>.txt` file of a directory into `<parent>/tts`
    Run {
        /// Directory with input text files
        #[arg(short, long)]
        input: PathBuf,

        /// Character configuration (JSON: name -> { speaker, pitch })
        #[arg(short, long, required_unless_present = "speaker")]
        characters: Option<PathBuf>,

        /// Use one voice for every file instead of the character configuration
        #[arg(long, conflicts_with = "characters")]
        speaker: Option<String>,

        /// Pitch recorded for files synthesized with --speaker
        #[arg(long, default_value_t = 0, requires = "speaker")]
        pitch: i32,

        #[command(flatten)]
        synthesis: SynthesisArgs,
    },
    /// Print the segments a text file is split into
    Segments {
        /// Input text file
        file: PathBuf,

        /// Voice whose configured limit is used
        #[arg(long, conflicts_with = "limit", required_unless_present = "limit")]
        voice: Option<String>,

        /// Explicit segment length limit
        #[arg(long)]
        limit: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Find the longest segment each voice synthesizes without failing
    Probe {
        /// Sample text file
        file: PathBuf,

        /// Probe only this voice (default: every configured voice)
        #[arg(long)]
        voice: Option<String>,

        #[command(flatten)]
        synthesis: SynthesisArgs,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for the configured synthesis settings.
#[derive(clap::Args, Debug)]
struct SynthesisArgs {
    /// Synthesis backend
    #[arg(long, value_enum, default_value_t = BackendKind::Silero)]
    backend: BackendKind,

    /// Output sample rate (48000, 24000 or 8000)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Byte budget per output WAV file
    #[arg(long)]
    file_size_limit: Option<u64>,

    /// Device to use (cpu, cuda, auto)
    #[arg(long)]
    device: Option<String>,

    /// Do not place stress marks
    #[arg(long, default_value_t = false)]
    no_accent: bool,

    /// Do not restore the letter ё
    #[arg(long, default_value_t = false)]
    no_yo: bool,
}

impl SynthesisArgs {
    fn apply(&self, settings: &mut TtsBatchConfig) {
        if let Some(rate) = self.sample_rate {
            settings.sample_rate = rate;
        }
        if let Some(limit) = self.file_size_limit {
            settings.file_size_limit = limit;
        }
        if let Some(device) = &self.device {
            settings.device = device.clone();
        }
        if self.no_accent {
            settings.put_accent = false;
        }
        if self.no_yo {
            settings.put_yo = false;
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default device
    SetDevice {
        /// cpu, cuda or auto
        device: String,
    },
    /// Set default sample rate
    SetSampleRate {
        /// 48000, 24000 or 8000
        rate: u32,
    },
    /// Set the byte budget per output file
    SetFileSizeLimit {
        /// Bytes, header included
        bytes: u64,
    },
    /// Set the segment length limit of a voice
    SetLimit {
        voice: String,
        /// Characters per segment, terminator included (> 3)
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match &args.command {
        Commands::Run {
            input,
            characters,
            speaker,
            pitch,
            synthesis,
        } => {
            let voices = match (characters, speaker) {
                (_, Some(voice)) => VoiceSelection::Fixed {
                    voice: voice.clone(),
                    pitch: *pitch,
                },
                (Some(path), None) => VoiceSelection::ByCharacter(CharacterMap::load(path)?),
                (None, None) => anyhow::bail!("Either --characters or --speaker is required"),
            };
            run_batch(input, &voices, synthesis, args.quiet)
        }
        Commands::Segments {
            file,
            voice,
            limit,
            output,
        } => dump_segments(file, voice.as_deref(), *limit, output.as_deref()),
        Commands::Probe {
            file,
            voice,
            synthesis,
        } => run_probe(file, voice.as_deref(), synthesis),
        Commands::Config { action } => handle_config_command(action),
    }
}

fn load_settings(synthesis: &SynthesisArgs) -> Result<TtsBatchConfig> {
    let mut settings = TtsBatchConfig::load().context("Failed to load configuration")?;
    synthesis.apply(&mut settings);
    Ok(settings)
}

fn run_batch(
    input: &Path,
    voices: &VoiceSelection,
    synthesis: &SynthesisArgs,
    quiet: bool,
) -> Result<()> {
    if !input.is_dir() {
        anyhow::bail!("Input directory not found: {}", input.display());
    }

    let settings = load_settings(synthesis)?;
    let config = BatchConfig::from_settings(&settings)?.with_progress(!quiet);
    // Fail on configuration before loading the model
    voices.validate(&config)?;

    let synthesizer = tts::create_backend(synthesis.backend, &settings)?;
    let report = BatchDriver::new(&config, voices, synthesizer.as_ref()).run(input)?;

    let outputs: usize = report.files.iter().map(|f| f.outputs.len()).sum();
    log::info!(
        "Done: {} file(s) synthesized into {} WAV file(s) in {}",
        report.files.len(),
        outputs,
        report.output_dir.display()
    );
    if !report.skipped_files.is_empty() {
        log::warn!("{} file(s) skipped", report.skipped_files.len());
    }
    if report.skipped_segment_count() > 0 {
        log::warn!(
            "{} segment(s) skipped, see {}",
            report.skipped_segment_count(),
            batch::report::REPORT_FILE_NAME
        );
    }

    for failed in &report.failed_files {
        log::error!("{}: {}", failed.input.display(), failed.error);
    }
    report.check()
}

fn dump_segments(
    file: &Path,
    voice: Option<&str>,
    limit: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let limit = match (limit, voice) {
        (Some(limit), _) => limit,
        (None, Some(voice)) => {
            let settings = TtsBatchConfig::load().context("Failed to load configuration")?;
            BatchConfig::from_settings(&settings)?.limit_for(voice)?
        }
        (None, None) => anyhow::bail!("Either --voice or --limit is required"),
    };

    let lines = batch::load_lines(file)?;
    let segmentation = text::preprocess(&lines, limit)?;

    match output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            batch::write_segments(&segmentation, &mut BufWriter::new(out))?;
        }
        None => batch::write_segments(&segmentation, &mut io::stdout().lock())?,
    }

    io::stdout().flush()?;
    eprintln!(
        "{} segment(s), {} characters (limit {})",
        segmentation.len(),
        segmentation.total_chars,
        limit
    );
    Ok(())
}

fn run_probe(file: &Path, voice: Option<&str>, synthesis: &SynthesisArgs) -> Result<()> {
    let settings = load_settings(synthesis)?;
    let config = BatchConfig::from_settings(&settings)?.with_progress(false);
    if let Some(voice) = voice {
        config.limit_for(voice)?;
    }

    let lines = batch::load_lines(file)?;
    let synthesizer = tts::create_backend(synthesis.backend, &settings)?;

    let results = match voice {
        Some(voice) => {
            let start = config.limit_for(voice)?;
            let result = probe::find_max_limit(
                synthesizer.as_ref(),
                &lines,
                voice,
                start,
                &config.synthesis,
            );
            vec![(voice.to_string(), result)]
        }
        None => probe::find_max_limits(synthesizer.as_ref(), &lines, &config),
    };

    let mut exhausted = 0;
    for (voice, result) in &results {
        match result {
            LimitSearch::Found { limit } => println!("{} = {}", voice, limit),
            LimitSearch::Exhausted { reason } => {
                exhausted += 1;
                println!("{} = (none: {})", voice, reason);
            }
        }
    }

    if exhausted > 0 {
        anyhow::bail!("No working limit found for {} voice(s)", exhausted);
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = TtsBatchConfig::load()?;
            println!("Configuration file: {:?}", TtsBatchConfig::config_path()?);
            println!();
            println!("device = \"{}\"", config.device);
            println!("threads = {}", config.threads);
            println!("model_id = \"{}\"", config.model_id);
            println!("language = \"{}\"", config.language);
            println!("sample_rate = {}", config.sample_rate);
            println!("put_accent = {}", config.put_accent);
            println!("put_yo = {}", config.put_yo);
            println!("file_size_limit = {}", config.file_size_limit);
            println!();
            println!("[line_length_limits]");
            for (voice, limit) in &config.line_length_limits {
                println!("{} = {}", voice, limit);
            }
        }
        ConfigAction::SetDevice { device } => {
            let mut config = TtsBatchConfig::load()?;
            config.device = device.clone();
            config.save()?;
            println!("Default device set to: {}", config.device);
        }
        ConfigAction::SetSampleRate { rate } => {
            let mut config = TtsBatchConfig::load()?;
            config.sample_rate = *rate;
            BatchConfig::from_settings(&config)?;
            config.save()?;
            println!("Default sample rate set to: {}", config.sample_rate);
        }
        ConfigAction::SetFileSizeLimit { bytes } => {
            let mut config = TtsBatchConfig::load()?;
            config.file_size_limit = *bytes;
            BatchConfig::from_settings(&config)?;
            config.save()?;
            println!("File size limit set to: {} bytes", config.file_size_limit);
        }
        ConfigAction::SetLimit { voice, limit } => {
            let mut config = TtsBatchConfig::load()?;
            config.line_length_limits.insert(voice.clone(), *limit);
            BatchConfig::from_settings(&config)?;
            config.save()?;
            println!("Line length limit for {} set to: {}", voice, limit);
        }
    }
    Ok(())
}
