/*!
    Multi-stream interleaving muxer engine for the avmux crate ecosystem.

    Raw elementary streams are pushed in as bytes, in chunks of any size.
    The engine identifies each stream, normalizes frame timing, and feeds
    frames to a container writer while keeping the streams within the
    container's interleave tolerance of each other. Container bytes are
    drained by the caller whenever it likes.

    Parsing and container encoding are delegated to collaborators through
    the [`Demuxer`] and [`ContainerWriter`] traits; `avmux-ffmpeg` provides
    FFmpeg-backed implementations.

    # Basic Usage

    ```ignore
    use avmux_sink::{AvMuxer, MuxerConfig, Rational};

    let config = MuxerConfig::fragmented_mp4()
        .with_video(Rational::new(1, 24))
        .with_audio();

    let mut muxer = AvMuxer::new(config, writer, [video_demuxer, audio_demuxer])?;

    for (video, audio) in chunks {
        if muxer.mux_video(video)? {
            out.write_all(&muxer.take_output())?;
        }
        if muxer.mux_audio(audio)? {
            out.write_all(&muxer.take_output())?;
        }
    }

    // Drain what is left and write the trailer
    out.write_all(&muxer.finish()?)?;
    ```

    # Output Gating

    Nothing is written until every stream has been identified. A stream
    that runs more than the drift limit ahead of the slowest stream is not
    muxed until the others catch up; the limit is a fraction (8/10 by
    default) of the container's maximum interleave delta.

    # Errors

    Not having enough data is never an error, it shows up as zero frames
    muxed. Header, packet and trailer write failures abort the session and
    every later call returns [`Error::Aborted`].
*/

pub use avmux_types::{
    Error, LogLevel, Logger, MediaDuration, NoopLogger, Packet, Pts, Rational, Result, StreamType,
};

mod backend;
mod buffer;
mod config;
mod container;
mod drift;
mod logging;
mod muxer;
mod output;
mod stream;

pub use backend::{ContainerWriter, Demuxer, ProbeStatus, ProbedStream, ReadStatus};
pub use buffer::{InputReader, StreamBuffer};
pub use config::{ContainerFormat, MuxerConfig, StreamConfig};
pub use container::{ContainerOrchestrator, ContainerState};
pub use drift::DriftTracker;
pub use logging::TracingLogger;
pub use muxer::{AvMuxer, Muxer, SingleStreamMuxer};
pub use output::OutputBuffer;
pub use stream::{ProbeState, StreamContext};
