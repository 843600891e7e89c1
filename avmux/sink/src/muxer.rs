/*!
    Fixed-arity front end over [`ContainerOrchestrator`].
*/

use avmux_types::{Error, Logger, Result, StreamType};

use crate::backend::{ContainerWriter, Demuxer};
use crate::config::MuxerConfig;
use crate::container::ContainerOrchestrator;

/**
    Muxer for a fixed number of streams, known at compile time.

    Every push is immediately followed by muxing the stream it went to, so
    each call answers whether container bytes are ready to be taken.

    ```ignore
    let config = MuxerConfig::fragmented_mp4()
        .with_video(Rational::new(1, 24))
        .with_audio();
    let mut muxer = AvMuxer::new(config, writer, [video_demuxer, audio_demuxer])?;

    if muxer.mux_video(&chunk)? {
        out.write_all(&muxer.take_output())?;
    }
    ```
*/
pub struct Muxer<W, D, const N: usize>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    container: ContainerOrchestrator<W, D>,
}

/// Muxer for one video and one audio stream.
pub type AvMuxer<W, D> = Muxer<W, D, 2>;

/// Muxer for a single stream.
pub type SingleStreamMuxer<W, D> = Muxer<W, D, 1>;

impl<W, D, const N: usize> Muxer<W, D, N>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    /**
        Create a muxer. `config` must declare exactly `N` streams.

        # Errors

        Fails on a stream count mismatch or an invalid configuration, such
        as a framerate that is not strictly positive.
    */
    pub fn new(config: MuxerConfig, writer: W, demuxers: [D; N]) -> Result<Self> {
        check_arity::<N>(&config)?;
        let container = ContainerOrchestrator::new(config, writer, Vec::from(demuxers))?;
        Ok(Self { container })
    }

    /**
        Create a muxer that reports through `logger`.
    */
    pub fn with_logger(
        config: MuxerConfig,
        writer: W,
        demuxers: [D; N],
        logger: impl Logger + 'static,
    ) -> Result<Self> {
        check_arity::<N>(&config)?;
        let container =
            ContainerOrchestrator::with_logger(config, writer, Vec::from(demuxers), logger)?;
        Ok(Self { container })
    }

    /**
        Push data to a stream and mux it.

        Returns true if output is waiting to be taken.
    */
    pub fn mux(&mut self, stream: usize, data: &[u8]) -> Result<bool> {
        self.container.push(stream, data)?;
        self.container.mux_stream(stream)?;
        Ok(self.container.has_output())
    }

    /**
        Push data to the stream with the given name and mux it.
    */
    pub fn mux_named(&mut self, name: &str, data: &[u8]) -> Result<bool> {
        let stream = self
            .container
            .stream_index(name)
            .ok_or_else(|| Error::unknown_stream(name))?;
        self.mux(stream, data)
    }

    /**
        Push data to the first stream of the given kind and mux it.
    */
    pub fn mux_kind(&mut self, kind: StreamType, data: &[u8]) -> Result<bool> {
        let stream = self
            .container
            .stream_of_kind(kind)
            .ok_or_else(|| Error::unknown_stream(kind.as_str()))?;
        self.mux(stream, data)
    }

    /**
        Mux everything that is buffered. See [`ContainerOrchestrator::flush`].
    */
    pub fn flush(&mut self) -> Result<bool> {
        self.container.flush()
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        self.container.take_output()
    }

    pub fn has_output(&self) -> bool {
        self.container.has_output()
    }

    /**
        Declare that no more bytes will be pushed. See
        [`ContainerOrchestrator::end_of_input`].
    */
    pub fn end_of_input(&mut self) -> Result<bool> {
        self.container.end_of_input()
    }

    /**
        End the session and return the remaining container bytes.
    */
    pub fn finish(self) -> Result<Vec<u8>> {
        self.container.finish()
    }

    /**
        The underlying orchestrator, for introspection.
    */
    pub fn container(&self) -> &ContainerOrchestrator<W, D> {
        &self.container
    }
}

impl<W, D> Muxer<W, D, 2>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    /**
        Push data to the video stream and mux it.
    */
    pub fn mux_video(&mut self, data: &[u8]) -> Result<bool> {
        self.mux_kind(StreamType::Video, data)
    }

    /**
        Push data to the audio stream and mux it.
    */
    pub fn mux_audio(&mut self, data: &[u8]) -> Result<bool> {
        self.mux_kind(StreamType::Audio, data)
    }
}

impl<W, D, const N: usize> std::fmt::Debug for Muxer<W, D, N>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Muxer")
            .field("container", &self.container)
            .finish()
    }
}

fn check_arity<const N: usize>(config: &MuxerConfig) -> Result<()> {
    if config.streams.len() != N {
        return Err(Error::StreamCount {
            expected: N,
            actual: config.streams.len(),
        });
    }
    Ok(())
}
