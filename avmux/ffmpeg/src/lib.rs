/*!
    FFmpeg-backed collaborators for the avmux muxing engine.

    [`FfmpegDemuxer`] identifies and reads raw elementary streams (H.264,
    HEVC, AAC, ...) straight out of the engine's stream buffers, and
    [`FfmpegWriter`] muxes them into a container held in memory. Both run
    on custom AVIO contexts; nothing touches the filesystem.

    # Basic Usage

    ```ignore
    use avmux_ffmpeg::{FfmpegDemuxer, FfmpegWriter};
    use avmux_sink::{AvMuxer, MuxerConfig, Rational};

    let config = MuxerConfig::fragmented_mp4()
        .with_video(Rational::new(1, 24))
        .with_audio();
    let writer = FfmpegWriter::new(config.format)?;

    let mut muxer = AvMuxer::new(config, writer, [FfmpegDemuxer::new(), FfmpegDemuxer::new()])?;
    ```
*/

mod codec;
mod convert;
mod demux;
mod io;
mod mux;

pub use codec::CodecParameters;
pub use demux::FfmpegDemuxer;
pub use mux::FfmpegWriter;
