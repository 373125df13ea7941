pub mod algorithm;
pub mod commands;
pub mod error;
pub mod models;

use std::ops::Range;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use commands::export::{export_camera_track, playback_camera_track, ExportState, TrackContext};
use commands::project::load_project;
use error::{CameraError, CameraResult};

#[derive(Parser)]
#[command(name = "camerapath")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Zoom and pan camera track for screen recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TrackArgs {
    /// Project file or the directory containing camera-project.json
    #[arg(default_value = ".")]
    project: String,

    /// Override the output frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// First frame to sample
    #[arg(long, default_value = "0")]
    start: u64,

    /// One past the last frame to sample (defaults to the end of the recording)
    #[arg(long)]
    end: Option<u64>,

    /// Write the track here instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the deterministic camera track, as the renderer sees it
    Export {
        #[command(flatten)]
        track: TrackArgs,

        /// Number of blocking workers
        #[arg(short, long, default_value = "4")]
        workers: usize,
    },

    /// Sample the camera track with carried spring physics, as live preview sees it
    Playback {
        #[command(flatten)]
        track: TrackArgs,
    },
}

pub fn run() -> CameraResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli.command))
}

async fn dispatch(command: Commands) -> CameraResult<()> {
    match command {
        Commands::Export { track, workers } => {
            let (context, frames) = open_track(&track).await?;
            let state = ExportState::default();
            let sampled = export_camera_track(context, frames, workers, &state).await?;
            write_track(&sampled, track.output.as_deref()).await
        }
        Commands::Playback { track } => {
            let (context, frames) = open_track(&track).await?;
            let sampled = playback_camera_track(context, frames).await?;
            write_track(&sampled, track.output.as_deref()).await
        }
    }
}

async fn open_track(args: &TrackArgs) -> CameraResult<(Arc<TrackContext>, Range<u64>)> {
    let mut loaded = load_project(&args.project).await?;
    if let Some(fps) = args.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CameraError::InvalidFrameRate(fps));
        }
        loaded.project.output.fps = fps;
    }

    let context = TrackContext::from_loaded(&loaded)?;
    let frame_count = context.frame_count();
    let end = args.end.unwrap_or(frame_count).min(frame_count);
    let start = args.start.min(end);
    log::info!(
        "open_track: project={} frames={start}..{end} of {frame_count}",
        loaded.project.id
    );

    Ok((Arc::new(context), start..end))
}

async fn write_track<T: serde::Serialize>(track: &T, output: Option<&str>) -> CameraResult<()> {
    let json = serde_json::to_string_pretty(track)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            log::info!("write_track: saved {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
