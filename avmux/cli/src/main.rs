use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use avmux_sink::{ContainerFormat, Rational};

mod feed;

/// Size of each read from the input files, in bytes.
const DEFAULT_CHUNK_SIZE: usize = 256 * 4096;

/**
    Mux raw elementary streams into a container file.
*/
#[derive(Parser, Debug)]
#[command(name = "avmux", version, about, long_about = None)]
struct Cli {
    /// Raw video elementary stream (H.264, HEVC, ...).
    #[arg(short, long)]
    video: PathBuf,

    /// Raw audio elementary stream (AAC ADTS, MP3, ...).
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Output file. Defaults to the video path with the container's extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Nominal video framerate, in frames per second.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u16).range(1..))]
    fps: u16,

    /// Container format: fmp4, mp4, mkv, or mpegts.
    #[arg(short, long, default_value = "fmp4")]
    format: ContainerFormat,

    /// Bytes read from each input per round.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.video, cli.format));

    let options = feed::FeedOptions {
        format: cli.format,
        framerate: Rational::new(1, i32::from(cli.fps)),
        chunk_size: cli.chunk_size.max(1),
    };

    let bytes = match &cli.audio {
        Some(audio) => feed::mux_video_audio(&cli.video, audio, &output, &options),
        None => feed::mux_video(&cli.video, &output, &options),
    }
    .with_context(|| format!("failed to mux into {}", output.display()))?;

    tracing::info!("wrote {bytes} bytes to {}", output.display());
    Ok(())
}

fn default_output(video: &Path, format: ContainerFormat) -> PathBuf {
    video.with_extension(format.extension())
}
