//! musica - play one audio clip and control it from stdin
//!
//! Commands: play, pause, resume, stop, loop, seek <ms>, pos <ms>,
//! volume <0..1>, status, quit

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader as AsyncBufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use musica_lib::audio::{AudioBackend, DeviceBackend, HeadlessBackend};
use musica_lib::commands::{self, Command, Reply};
use musica_lib::{ClipPlayer, PlayerSettings};

#[derive(Parser, Debug)]
#[command(name = "musica")]
#[command(about = "Play an audio clip with transport control on stdin")]
#[command(version)]
struct Args {
    /// Audio file to load
    file: PathBuf,

    /// Loop continuously when started with `loop` or --autoplay
    #[arg(short, long = "loop")]
    looping: bool,

    /// Initial volume (0.0 to 1.0)
    #[arg(short, long)]
    volume: Option<f32>,

    /// Delay before the loop start fires
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Directory holding settings.json
    #[arg(short, long, env = "MUSICA_CONFIG_DIR")]
    config: Option<PathBuf>,

    /// Output device name
    #[arg(long)]
    device: Option<String>,

    /// Run without an output device (clip advances in real time, silently)
    #[arg(long)]
    no_device: bool,

    /// Fire the loop start immediately after loading
    #[arg(long)]
    autoplay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "musica=info,musica_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(dir) => PlayerSettings::load(dir).context("Failed to load settings")?,
        None => PlayerSettings::default(),
    };
    if let Some(volume) = args.volume {
        settings.default_volume = volume;
    }
    if let Some(delay) = args.delay_ms {
        settings.loop_start_delay_ms = delay;
    }
    if args.device.is_some() {
        settings.output_device = args.device.clone();
    }
    if settings.format_hint.is_none() {
        settings.format_hint = args
            .file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
    }
    settings.validate().context("Invalid settings")?;

    let backend: Box<dyn AudioBackend> = if args.no_device {
        Box::new(HeadlessBackend::realtime())
    } else {
        Box::new(DeviceBackend::new(settings.output_device.clone()))
    };

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open audio file: {:?}", args.file))?;
    let mut player = ClipPlayer::open(BufReader::new(file), args.looping, backend.as_ref(), &settings)
        .with_context(|| format!("Failed to load {:?}", args.file))?;

    info!(
        "Loaded {:?} ({:.1} s)",
        args.file,
        player.length() as f64 / 1_000_000.0
    );

    if args.autoplay {
        player.start_loop_task().context("Failed to schedule playback")?;
    }

    let mut lines = AsyncBufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("error: {}", e);
                continue;
            }
        };

        match commands::apply(&mut player, command) {
            Ok(Reply::Ok) => println!("ok"),
            Ok(Reply::Status(status)) => println!("{}", serde_json::to_string(&status)?),
            Ok(Reply::Quit) => break,
            Err(e) => {
                warn!("{:?} failed: {}", command, e);
                println!("error: {}", e);
            }
        }
    }

    player.close()?;
    Ok(())
}
