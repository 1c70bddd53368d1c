use anyhow::{Context, Result};
use bell_core::UploadResponse;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use midi_to_bells::{extract_sequence, MelodyError};

#[derive(Parser, Debug)]
#[command(name = "midi-to-bells")]
#[command(about = "Extract a five-bell melody from a MIDI file", long_about = None)]
struct Args {
    /// Path to the MIDI file (default: uses first .mid file in current directory)
    #[arg(short, long)]
    midi: Option<PathBuf>,

    /// Output file path (default: `<midi-name>.json`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of file
    #[arg(long)]
    stdout: bool,

    /// Suppress informational messages (only errors)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let midi_path = if let Some(path) = args.midi {
        if !path.exists() {
            anyhow::bail!("MIDI file not found: {}", path.display());
        }
        path
    } else {
        find_first_midi_file()?
    };

    let output_path = if let Some(path) = args.output {
        path
    } else {
        let stem = midi_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        PathBuf::from(format!("{}.json", stem))
    };

    tracing::info!("Processing MIDI file: {}", midi_path.display());

    let data = fs::read(&midi_path)
        .with_context(|| format!("Failed to read MIDI file: {}", midi_path.display()))?;

    // Extraction failures are still written out, in the upload error shape
    let response = match extract_sequence(&data) {
        Ok(sequence) => UploadResponse::success(sequence),
        Err(e @ (MelodyError::Parse(_) | MelodyError::InvalidTiming | MelodyError::NoMelody)) => {
            tracing::error!("{}", e);
            UploadResponse::failure(e.to_string())
        }
        Err(e) => return Err(e.into()),
    };
    let output = response.to_json_pretty()?;

    if args.stdout {
        println!("{}", output);
    } else {
        fs::write(&output_path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        tracing::info!("Output saved to {}", output_path.display());
    }

    Ok(())
}

fn find_first_midi_file() -> Result<PathBuf> {
    let entries = fs::read_dir(".").context("Failed to read current directory")?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("mid") | Some("midi")
        ) {
            return Ok(path);
        }
    }

    anyhow::bail!("No MIDI files found in current directory")
}
