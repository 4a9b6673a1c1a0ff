use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use voxcue::audio::wav::read_wav_file;
use voxcue::audio::AudioContext;
use voxcue::cli::{build_overrides, Cli, Commands, OutputFormat};
use voxcue::config::Config;
use voxcue::pipeline;
use voxcue::srt;
use voxcue::transcript::{EnhancedTranscript, Transcript};
use voxcue::{resolve, EnhanceError};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Enhance {
            input,
            audio,
            output,
            format,
            overrides,
            pipeline,
            engine,
            max_chars,
            max_duration,
            min_silence,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let overrides = build_overrides(
                overrides.as_deref(),
                pipeline,
                engine.as_deref(),
                max_chars,
                max_duration,
                min_silence,
            )
            .map_err(reject)?;
            run_enhance(
                &config,
                overrides.as_ref(),
                &input,
                audio.as_deref(),
                output.as_deref(),
                format,
            )
        }
        Commands::ConfigCheck { path } => {
            let path = path.unwrap_or_else(Config::default_path);
            let config = Config::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let resolved = resolve::resolve(&config, None).map_err(reject)?;
            println!("{} is valid", path.display());
            println!(
                "enabled={} pipeline={} vad.engine={}",
                resolved.enabled, resolved.pipeline, resolved.vad.engine
            );
            Ok(())
        }
    }
}

fn run_enhance(
    config: &Config,
    overrides: Option<&voxcue::resolve::EnhanceOverrides>,
    input: &Path,
    audio: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let json = read_input(input)?;
    let transcript = Transcript::from_json(&json).map_err(reject)?;

    let audio_context: Option<AudioContext> = match audio {
        Some(path) => Some(
            read_wav_file(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    // Validation failures surface to the caller; pipeline failures fall back
    // to the un-enhanced input.
    let resolved = resolve::resolve(config, overrides).map_err(reject)?;
    let include_metadata = resolved.include_metadata;
    let mut pipeline = pipeline::build(resolved).map_err(reject)?;
    let outcome = pipeline.run_or_passthrough(transcript.segments.clone(), audio_context.as_ref());

    let rendered = match format {
        OutputFormat::Srt => srt::render(&outcome.segments),
        OutputFormat::Json => {
            let enhanced = EnhancedTranscript {
                duration: transcript.duration,
                language: transcript.language.clone(),
                segments: outcome.segments,
                enhancement: include_metadata.then_some(outcome.report),
            };
            enhanced.to_json()?
        }
    };

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

/// Wraps a validation error for display without a backtrace-heavy chain.
fn reject(error: EnhanceError) -> anyhow::Error {
    anyhow::anyhow!(error)
}

fn init_logging(quiet: bool, verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "voxcue=debug,info",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
