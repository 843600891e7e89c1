/*!
    Per-stream probing and frame retrieval.
*/

use avmux_types::{LogLevel, Logger, MediaDuration, Packet, Pts, Rational};

use crate::backend::{Demuxer, ProbeStatus, ReadStatus};
use crate::buffer::StreamBuffer;

/**
    Identification state of a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeState {
    /// Not identified yet, or the last attempt ran out of data. Retried
    /// once more data has been appended, or once the input has ended.
    Unprobed,
    /// Identified; frames can be read.
    Probed,
    /// The last attempt failed on the buffered data. Retried once more
    /// data has been appended.
    Failed,
}

/**
    One elementary input stream: its unparsed bytes, its demuxer, and the
    timing state used to normalize the frames it yields.
*/
pub struct StreamContext<D: Demuxer> {
    index: usize,
    name: String,
    buffer: StreamBuffer,
    demuxer: D,
    state: ProbeState,
    // Bytes appended when the last unsuccessful probe ran
    attempted_at: Option<u64>,
    input_ended: bool,
    framerate: Option<Rational>,
    time_base: Option<Rational>,
    codec: Option<D::Codec>,
    frame_counter: u64,
}

impl<D: Demuxer> StreamContext<D> {
    /**
        Create a stream context.

        `framerate` is the declared nominal frame duration (1/24 for 24 fps).
        When present it is also the stream's initial time base.
    */
    pub fn new(index: usize, name: impl Into<String>, framerate: Option<Rational>, demuxer: D) -> Self {
        Self {
            index,
            name: name.into(),
            buffer: StreamBuffer::new(),
            demuxer,
            state: ProbeState::Unprobed,
            attempted_at: None,
            input_ended: false,
            framerate,
            time_base: framerate,
            codec: None,
            frame_counter: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /**
        Time base frames are normalized into. `None` until the stream is
        identified when no framerate was declared.
    */
    pub fn time_base(&self) -> Option<Rational> {
        self.time_base
    }

    /**
        Adopt the time base chosen by the container for this stream.
    */
    pub fn set_time_base(&mut self, time_base: Rational) {
        self.time_base = Some(time_base);
    }

    /**
        Codec parameters found by the probe.
    */
    pub fn codec(&self) -> Option<&D::Codec> {
        self.codec.as_ref()
    }

    /**
        Number of frames yielded so far.
    */
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /**
        Number of buffered bytes not yet consumed by the demuxer.
    */
    pub fn buffered_len(&self) -> usize {
        self.buffer.remaining()
    }

    /**
        Append raw elementary data.
    */
    pub fn fill_buffer(&mut self, data: &[u8]) {
        self.buffer.append(data);
    }

    /**
        Mark the buffered bytes as the whole remaining input.

        The demuxer is told so it can release what it holds back, and a
        stream that ran out of data while probing gets one more attempt.
    */
    pub fn end_of_input(&mut self) {
        if self.input_ended {
            return;
        }
        self.input_ended = true;
        self.demuxer.end_of_input();
        if self.state == ProbeState::Unprobed {
            self.attempted_at = None;
        }
    }

    /**
        Identify the stream if that has not happened yet.

        Returns true once the stream is identified. Unsuccessful attempts
        leave the buffered bytes untouched, and the stream is only probed
        again after more data was appended.
    */
    pub fn probe(&mut self, log: &dyn Logger) -> bool {
        if self.state == ProbeState::Probed {
            return true;
        }
        let appended = self.buffer.total_appended();
        if self.attempted_at == Some(appended) || self.buffer.is_empty() {
            return false;
        }

        let start = self.buffer.position();
        let status = self.demuxer.probe(&mut self.buffer.reader());

        match status {
            ProbeStatus::Identified(probed) => {
                if !self.time_base.is_some_and(Rational::is_valid) {
                    self.time_base = Some(probed.time_base);
                }
                self.codec = Some(probed.codec);
                self.state = ProbeState::Probed;
                log.log(
                    &format!(
                        "stream '{}' identified, native time base {}",
                        self.name, probed.time_base
                    ),
                    LogLevel::Info,
                );
                true
            }
            ProbeStatus::NeedMoreData => {
                self.buffer.rewind(start);
                self.demuxer.reset();
                self.state = ProbeState::Unprobed;
                self.attempted_at = Some(appended);
                log.log(
                    &format!(
                        "stream '{}': not enough data buffered to identify it ({} bytes)",
                        self.name,
                        self.buffer.remaining()
                    ),
                    LogLevel::Warning,
                );
                false
            }
            ProbeStatus::Failed(message) => {
                self.buffer.rewind(start);
                self.demuxer.reset();
                self.state = ProbeState::Failed;
                self.attempted_at = Some(appended);
                log.log(
                    &format!("stream '{}': probe failed: {message}", self.name),
                    LogLevel::Error,
                );
                false
            }
        }
    }

    /**
        Read the next frame, normalized into the stream's time base.

        Returns `None` when the stream cannot be identified yet or no
        complete frame is buffered. Frames without timestamps get
        synthesized ones, one nominal frame duration apart.
    */
    pub fn next_frame(&mut self, log: &dyn Logger) -> Option<Packet> {
        if !self.probe(log) {
            return None;
        }
        let time_base = self.time_base?;

        loop {
            let mut reader = self.buffer.reader();
            let status = self.demuxer.read_packet(&mut reader);
            let progressed = reader.consumed() > 0;

            match status {
                Ok(ReadStatus::Packet(packet)) if packet.is_empty() => {
                    if !progressed {
                        return None;
                    }
                }
                Ok(ReadStatus::Packet(packet)) => return Some(self.normalize(packet, time_base)),
                Ok(ReadStatus::NeedMoreData) => return None,
                Err(e) => {
                    log.log(
                        &format!("stream '{}': failed to read frame: {e}", self.name),
                        LogLevel::Error,
                    );
                    return None;
                }
            }
        }
    }

    fn normalize(&mut self, mut packet: Packet, time_base: Rational) -> Packet {
        let native = packet.time_base;

        match packet.pts {
            None => {
                let tick = self.framerate.unwrap_or(native);
                let duration = MediaDuration::one_tick(tick, time_base);
                let ts = Pts(duration.0 * self.frame_counter as i64);
                packet.pts = Some(ts);
                packet.dts = Some(ts);
                packet.duration = duration;
            }
            Some(pts) => {
                let dts = packet.dts.unwrap_or(pts);
                packet.pts = Some(pts.rescale(native, time_base));
                packet.dts = Some(dts.rescale(native, time_base));
                packet.duration = packet.duration.rescale(native, time_base);
            }
        }

        packet.time_base = time_base;
        packet.stream_index = self.index;
        self.frame_counter += 1;
        packet
    }
}

impl<D: Demuxer> std::fmt::Debug for StreamContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamContext")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("input_ended", &self.input_ended)
            .field("time_base", &self.time_base)
            .field("buffered", &self.buffer.remaining())
            .field("frames", &self.frame_counter)
            .finish_non_exhaustive()
    }
}
