/*!
    Container orchestration: header gating, drift-limited interleaving,
    and output draining.
*/

use avmux_types::{Error, LogLevel, Logger, NoopLogger, Rational, Result, StreamType};

use crate::backend::{ContainerWriter, Demuxer};
use crate::config::MuxerConfig;
use crate::drift::DriftTracker;
use crate::output::OutputBuffer;
use crate::stream::{ProbeState, StreamContext};

/**
    Lifecycle of a muxing session.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// Waiting for every stream to be identified; no output yet.
    Collecting,
    /// Header written; frames are being muxed.
    Active,
    /// A fatal error ended the session.
    Aborted,
}

/**
    Drives a set of elementary streams into a single container.

    Bytes pushed into a stream are only parsed when that stream is muxed.
    No container bytes are produced until every stream has been
    identified; from then on each stream is muxed until it runs dry or
    gets too far ahead of the others.
*/
pub struct ContainerOrchestrator<W, D>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    writer: W,
    streams: Vec<StreamContext<D>>,
    kinds: Vec<StreamType>,
    drift: DriftTracker,
    output: OutputBuffer,
    state: ContainerState,
    header_written: bool,
    interleave_ratio: Rational,
    max_interleave_delta: Option<i64>,
    logger: Box<dyn Logger>,
}

impl<W, D> ContainerOrchestrator<W, D>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    /**
        Create an orchestrator, declaring every configured stream on the
        writer. `demuxers` pairs up with `config.streams` by position.

        # Errors

        Returns an error if the configuration is invalid, if the number of
        demuxers does not match the number of streams, or if the writer
        rejects a stream declaration.
    */
    pub fn new(config: MuxerConfig, writer: W, demuxers: Vec<D>) -> Result<Self> {
        Self::with_logger_boxed(config, writer, demuxers, Box::new(NoopLogger))
    }

    /**
        Create an orchestrator that reports through `logger`.
    */
    pub fn with_logger(
        config: MuxerConfig,
        writer: W,
        demuxers: Vec<D>,
        logger: impl Logger + 'static,
    ) -> Result<Self> {
        Self::with_logger_boxed(config, writer, demuxers, Box::new(logger))
    }

    fn with_logger_boxed(
        config: MuxerConfig,
        mut writer: W,
        demuxers: Vec<D>,
        logger: Box<dyn Logger>,
    ) -> Result<Self> {
        config.validate()?;
        if demuxers.len() != config.streams.len() {
            return Err(Error::StreamCount {
                expected: config.streams.len(),
                actual: demuxers.len(),
            });
        }

        let mut streams = Vec::with_capacity(demuxers.len());
        let mut kinds = Vec::with_capacity(demuxers.len());
        for (position, (stream, demuxer)) in config.streams.into_iter().zip(demuxers).enumerate() {
            let index = writer.add_stream(stream.framerate)?;
            if index != position {
                return Err(Error::backend(format!(
                    "writer declared stream '{}' at index {index}, expected {position}",
                    stream.name
                )));
            }
            logger.log(
                &format!(
                    "declared {} stream '{}' at index {index}",
                    stream.kind.as_str(),
                    stream.name
                ),
                LogLevel::Debug,
            );
            kinds.push(stream.kind);
            streams.push(StreamContext::new(index, stream.name, stream.framerate, demuxer));
        }

        logger.log(
            &format!(
                "created {} container with {} streams",
                config.format,
                streams.len()
            ),
            LogLevel::Debug,
        );

        Ok(Self {
            writer,
            drift: DriftTracker::new(streams.len()),
            streams,
            kinds,
            output: OutputBuffer::new(),
            state: ContainerState::Collecting,
            header_written: false,
            interleave_ratio: config.interleave_ratio,
            max_interleave_delta: None,
            logger,
        })
    }

    /**
        Append raw elementary data to a stream. Nothing is parsed until the
        stream is muxed.
    */
    pub fn push(&mut self, stream: usize, data: &[u8]) -> Result<()> {
        self.check_alive()?;
        let context = self
            .streams
            .get_mut(stream)
            .ok_or_else(|| Error::unknown_stream(stream))?;
        context.fill_buffer(data);
        self.logger.log(
            &format!("pushed {} bytes to stream '{}'", data.len(), context.name()),
            LogLevel::Debug,
        );
        Ok(())
    }

    /**
        Mux as many buffered frames of one stream as possible.

        Returns the number of frames written. Zero is an ordinary outcome:
        the header is still pending, the stream has no complete frame
        buffered, or it is too far ahead of the other streams.

        # Errors

        Header and packet write failures are fatal and abort the session.
    */
    pub fn mux_stream(&mut self, stream: usize) -> Result<usize> {
        self.check_alive()?;
        if stream >= self.streams.len() {
            return Err(Error::unknown_stream(stream));
        }

        if self.state == ContainerState::Collecting && !self.try_write_header()? {
            return Ok(0);
        }

        if self.drift.is_limited(stream) {
            return Ok(0);
        }

        let mut written = 0;
        while let Some(packet) = self.streams[stream].next_frame(self.logger.as_ref()) {
            let duration = packet.duration;
            let time_base = packet.time_base;

            if let Err(e) = self.writer.write_packet(packet, &mut self.output) {
                return Err(self.abort(e));
            }
            written += 1;

            if self.drift.record(stream, duration, time_base) {
                break;
            }
        }

        if written > 0 {
            self.logger.log(
                &format!(
                    "muxed {written} frames from stream '{}'",
                    self.streams[stream].name()
                ),
                LogLevel::Debug,
            );
        }
        Ok(written)
    }

    /**
        Mux every stream repeatedly until a full pass writes nothing.

        Returns true if output is waiting to be taken.
    */
    pub fn flush(&mut self) -> Result<bool> {
        self.check_alive()?;
        loop {
            let mut written = 0;
            for stream in 0..self.streams.len() {
                written += self.mux_stream(stream)?;
            }
            if written == 0 {
                break;
            }
        }
        Ok(self.has_output())
    }

    /**
        Take every container byte produced so far.
    */
    pub fn take_output(&mut self) -> Vec<u8> {
        self.output.take()
    }

    /**
        Returns true if container bytes are waiting to be taken.
    */
    pub fn has_output(&self) -> bool {
        self.output.has_data()
    }

    /**
        Declare that no more bytes will be pushed to any stream.

        Every demuxer is told the input has ended, and streams that could
        not be identified on partial data get a final probe attempt.
        Returns true if the container header has been written.

        # Errors

        A header write failure is fatal and aborts the session.
    */
    pub fn end_of_input(&mut self) -> Result<bool> {
        self.check_alive()?;
        for stream in &mut self.streams {
            stream.end_of_input();
        }
        self.logger.log("end of input for every stream", LogLevel::Debug);

        if self.state == ContainerState::Collecting {
            self.try_write_header()?;
        }
        Ok(self.header_written)
    }

    /**
        End the session and return the remaining container bytes.

        Signals the end of input, drains every stream including frames held
        back by the drift limit, and writes the trailer. A session whose
        header was never written produces no trailer.
    */
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.end_of_input()?;

        match self.state {
            ContainerState::Active => {
                self.drain_all()?;
                if let Err(e) = self.writer.write_trailer(&mut self.output) {
                    return Err(self.abort(e));
                }
                self.logger.log("container trailer written", LogLevel::Info);
            }
            ContainerState::Collecting => {
                self.logger.log(
                    "finishing before every stream was identified, no container was written",
                    LogLevel::Warning,
                );
            }
            ContainerState::Aborted => return Err(Error::Aborted),
        }

        Ok(self.output.take())
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn is_header_written(&self) -> bool {
        self.header_written
    }

    /**
        The container's maximum interleave delta in microseconds, known once
        the header is written.
    */
    pub fn max_interleave_delta(&self) -> Option<i64> {
        self.max_interleave_delta
    }

    /**
        How far, in microseconds, a stream may run ahead of the slowest one.
        Known once the header is written.
    */
    pub fn drift_limit(&self) -> Option<i64> {
        self.max_interleave_delta.map(|_| self.drift.limit())
    }

    /**
        Lead of a stream over the slowest one, in microseconds.
    */
    pub fn relative_time_ahead(&self, stream: usize) -> Option<i64> {
        self.drift.ahead(stream)
    }

    pub fn is_limited(&self, stream: usize) -> bool {
        self.drift.is_limited(stream)
    }

    pub fn probe_state(&self, stream: usize) -> Option<ProbeState> {
        self.streams.get(stream).map(StreamContext::state)
    }

    /**
        Number of pushed bytes a stream has not parsed yet.
    */
    pub fn buffered_len(&self, stream: usize) -> Option<usize> {
        self.streams.get(stream).map(StreamContext::buffered_len)
    }

    pub fn frame_count(&self, stream: usize) -> Option<u64> {
        self.streams.get(stream).map(StreamContext::frame_count)
    }

    /**
        Time base a stream's frames are written in.
    */
    pub fn stream_time_base(&self, stream: usize) -> Option<Rational> {
        self.streams.get(stream).and_then(StreamContext::time_base)
    }

    /**
        Index of the stream with the given name.
    */
    pub fn stream_index(&self, name: &str) -> Option<usize> {
        self.streams.iter().position(|s| s.name() == name)
    }

    /**
        Index of the first stream of the given kind.
    */
    pub fn stream_of_kind(&self, kind: StreamType) -> Option<usize> {
        self.kinds.iter().position(|&k| k == kind)
    }

    pub fn stream_name(&self, stream: usize) -> Option<&str> {
        self.streams.get(stream).map(StreamContext::name)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn check_alive(&self) -> Result<()> {
        match self.state {
            ContainerState::Aborted => Err(Error::Aborted),
            _ => Ok(()),
        }
    }

    /**
        Identify every stream and write the header once all are identified.
        Returns true if the header has been written.
    */
    fn try_write_header(&mut self) -> Result<bool> {
        let logger = self.logger.as_ref();
        let mut identified = true;
        for stream in &mut self.streams {
            identified &= stream.probe(logger);
        }
        if !identified {
            return Ok(false);
        }

        if let Err(e) = self.write_header() {
            return Err(self.abort(e));
        }
        Ok(true)
    }

    fn write_header(&mut self) -> Result<()> {
        for stream in &self.streams {
            let (Some(codec), Some(time_base)) = (stream.codec(), stream.time_base()) else {
                return Err(Error::header(format!(
                    "stream '{}' has no codec parameters",
                    stream.name()
                )));
            };
            self.writer.set_stream_codec(stream.index(), codec, time_base)?;
        }

        self.writer.write_header(&mut self.output)?;
        self.header_written = true;

        for stream in &mut self.streams {
            let chosen = self.writer.stream_time_base(stream.index());
            if let Some(time_base) = chosen.filter(|tb| tb.is_positive()) {
                stream.set_time_base(time_base);
            }
        }

        let delta = self.writer.max_interleave_delta();
        let limit = DriftTracker::limit_from(delta, self.interleave_ratio);
        self.drift.set_limit(limit);
        self.max_interleave_delta = Some(delta);
        self.state = ContainerState::Active;

        self.logger.log(
            &format!(
                "container header written, max interleave delta {delta}us, drift limit {limit}us"
            ),
            LogLevel::Info,
        );
        Ok(())
    }

    /**
        Write every remaining frame regardless of the drift limit, one frame
        at a time from whichever stream is furthest behind.
    */
    fn drain_all(&mut self) -> Result<()> {
        let mut dry = vec![false; self.streams.len()];
        loop {
            let next = (0..self.streams.len())
                .filter(|&stream| !dry[stream])
                .min_by_key(|&stream| self.drift.ahead(stream).unwrap_or(0));
            let Some(stream) = next else {
                return Ok(());
            };

            let Some(packet) = self.streams[stream].next_frame(self.logger.as_ref()) else {
                dry[stream] = true;
                continue;
            };
            let duration = packet.duration;
            let time_base = packet.time_base;
            if let Err(e) = self.writer.write_packet(packet, &mut self.output) {
                return Err(self.abort(e));
            }
            self.drift.record(stream, duration, time_base);
        }
    }

    fn abort(&mut self, error: Error) -> Error {
        self.state = ContainerState::Aborted;
        self.logger
            .log(&format!("muxing session aborted: {error}"), LogLevel::Error);
        error
    }
}

impl<W, D> std::fmt::Debug for ContainerOrchestrator<W, D>
where
    W: ContainerWriter,
    D: Demuxer<Codec = W::Codec>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerOrchestrator")
            .field("state", &self.state)
            .field("streams", &self.streams)
            .field("drift", &self.drift)
            .field("output", &self.output.len())
            .finish_non_exhaustive()
    }
}
