use anyhow::{Context, Result};
use bell_audio::{AudioEngine, BellClips, Carillon};
use bell_player::{gateway_for, Bell, BellPlayer, BellPlayerConfig, PlaybackState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bell-player")]
#[command(about = "Play the melody of a MIDI file on five bells", long_about = None)]
struct Args {
    /// MIDI file to play (.mid or .midi)
    file: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with the bell clips (overrides the config)
    #[arg(short, long)]
    samples: Option<PathBuf>,

    /// Melody extraction service (overrides the config)
    #[arg(long)]
    extractor_url: Option<String>,

    /// Stop playback after this many milliseconds
    #[arg(long)]
    stop_after_ms: Option<u64>,

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
        .init();

    let mut config = match &args.config {
        Some(path) => BellPlayerConfig::from_file(path)?,
        None => BellPlayerConfig::default(),
    };
    if let Some(samples) = &args.samples {
        config.samples_dir = samples.clone();
    }
    if let Some(url) = &args.extractor_url {
        config.extractor_url = Some(url.clone());
    }

    let clips = BellClips::load_dir(&config.samples_dir).unwrap_or_else(|e| {
        tracing::warn!("Bells will be silent: {}", e);
        BellClips::new()
    });
    let carillon = Arc::new(Carillon::new(clips, config.gain));

    // The output stream is not Send; it stays here on the main thread
    let engine = match AudioEngine::new() {
        Ok(engine) => {
            if let Err(e) = carillon.connect(&engine) {
                tracing::warn!("Bells will be silent: {}", e);
            }
            Some(engine)
        }
        Err(e) => {
            tracing::warn!("Bells will be silent: {}", e);
            None
        }
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run(args, config, carillon));

    if let Some(engine) = engine {
        engine.stop()?;
    }
    result
}

async fn run(args: Args, config: BellPlayerConfig, carillon: Arc<Carillon>) -> Result<()> {
    let mut player = BellPlayer::new(gateway_for(&config), carillon);
    player
        .load(&args.file)
        .await
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let mut status = player.subscribe_status();
    let mut bells = player.subscribe_bells();
    player.play();

    let stop_after = async {
        match args.stop_after_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(stop_after, ctrl_c);

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                tracing::info!(state = ?current.state, "Progress {:.0}%", current.progress);
                if current.state == PlaybackState::Idle {
                    break;
                }
            }
            changed = bells.changed() => {
                if changed.is_err() {
                    break;
                }
                let flags = *bells.borrow_and_update();
                let ringing: Vec<&str> = Bell::ALL
                    .into_iter()
                    .filter(|bell| flags[bell.index()])
                    .map(Bell::name)
                    .collect();
                if !ringing.is_empty() {
                    tracing::info!("Ringing: {}", ringing.join(" "));
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                player.stop();
                break;
            }
            _ = &mut stop_after => {
                player.stop();
                break;
            }
        }
    }

    Ok(())
}
