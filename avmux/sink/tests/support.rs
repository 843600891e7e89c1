//! Scripted collaborators for driving the engine without FFmpeg.
//!
//! `ToyDemuxer` parses a tiny framed elementary format:
//!
//! - header: `TOY1`, a 4-byte codec tag, then the native time base as two
//!   big-endian `u32`s (16 bytes total)
//! - frame: big-endian `u16` payload length, a flag byte (0 untimed,
//!   1 timed), for timed frames a big-endian `i64` pts and `i64` duration,
//!   then the payload
//!
//! With lookahead enabled, `ToyDemuxer` behaves like a raw bitstream
//! parser: a header or frame only counts as complete once a following byte
//! is buffered, or once the input has ended.
//!
//! `RecordingWriter` emits a trivial container and keeps a copy of every
//! byte and packet it produced.

#![allow(dead_code)]

use avmux_sink::{
    ContainerWriter, Demuxer, Error, InputReader, MediaDuration, OutputBuffer, Packet,
    ProbeStatus, ProbedStream, Pts, Rational, ReadStatus, Result,
};

pub const MAGIC: &[u8; 4] = b"TOY1";
pub const HEADER_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToyCodec {
    pub tag: [u8; 4],
}

/// Header announcing a stream with the given codec tag and native time base.
pub fn header(tag: &[u8; 4], time_base: Rational) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_LEN);
    data.extend_from_slice(MAGIC);
    data.extend_from_slice(tag);
    data.extend_from_slice(&(time_base.num as u32).to_be_bytes());
    data.extend_from_slice(&(time_base.den as u32).to_be_bytes());
    data
}

/// Frame without timing information.
pub fn untimed_frame(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + 3);
    data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    data.push(0);
    data.extend_from_slice(payload);
    data
}

/// Frame with a pts and duration in the stream's native time base.
pub fn timed_frame(pts: i64, duration: i64, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + 19);
    data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    data.push(1);
    data.extend_from_slice(&pts.to_be_bytes());
    data.extend_from_slice(&duration.to_be_bytes());
    data.extend_from_slice(payload);
    data
}

#[derive(Debug, Default)]
pub struct ToyDemuxer {
    time_base: Option<Rational>,
    lookahead: bool,
    ended: bool,
    pub probes: usize,
    pub resets: usize,
}

impl ToyDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookahead() -> Self {
        Self {
            lookahead: true,
            ..Self::default()
        }
    }

    fn waits_for_more(&self, complete: usize, available: usize) -> bool {
        self.lookahead && !self.ended && available == complete
    }
}

impl Demuxer for ToyDemuxer {
    type Codec = ToyCodec;

    fn probe(&mut self, input: &mut InputReader<'_>) -> ProbeStatus<ToyCodec> {
        self.probes += 1;

        let available = input.peek();
        let prefix = available.len().min(MAGIC.len());
        if available[..prefix] != MAGIC[..prefix] {
            return ProbeStatus::Failed("unrecognized stream header".into());
        }

        let Some(magic) = input.read_array::<4>() else {
            return ProbeStatus::NeedMoreData;
        };
        debug_assert_eq!(&magic, MAGIC);
        let (Some(tag), Some(num), Some(den)) = (
            input.read_array::<4>(),
            input.read_array::<4>(),
            input.read_array::<4>(),
        ) else {
            return ProbeStatus::NeedMoreData;
        };

        let num = u32::from_be_bytes(num) as i32;
        let den = u32::from_be_bytes(den) as i32;
        if num <= 0 || den <= 0 {
            return ProbeStatus::Failed(format!("invalid time base {num}/{den}"));
        }
        if self.waits_for_more(HEADER_LEN, available.len()) {
            return ProbeStatus::NeedMoreData;
        }

        let time_base = Rational::new(num, den);
        self.time_base = Some(time_base);
        ProbeStatus::Identified(ProbedStream {
            time_base,
            codec: ToyCodec { tag },
        })
    }

    fn read_packet(&mut self, input: &mut InputReader<'_>) -> Result<ReadStatus> {
        let Some(time_base) = self.time_base else {
            return Err(Error::invalid_data("stream not identified"));
        };

        let available = input.peek();
        if available.len() < 3 {
            return Ok(ReadStatus::NeedMoreData);
        }
        let len = u16::from_be_bytes([available[0], available[1]]) as usize;
        let timed = match available[2] {
            0 => false,
            1 => true,
            flag => {
                // Skip the corrupt frame header so the stream can resync
                input.consume(3);
                return Err(Error::invalid_data(format!("bad frame flag {flag}")));
            }
        };
        let timing_len = if timed { 16 } else { 0 };
        let complete = 3 + timing_len + len;
        if available.len() < complete || self.waits_for_more(complete, available.len()) {
            return Ok(ReadStatus::NeedMoreData);
        }

        input.consume(3);
        let mut packet = if timed {
            let pts = i64::from_be_bytes(input.read_array::<8>().unwrap_or_default());
            let duration = i64::from_be_bytes(input.read_array::<8>().unwrap_or_default());
            let payload = input.read_bytes(len).unwrap_or_default().to_vec();
            Packet::new(payload, time_base).with_timing(Pts(pts), Pts(pts), MediaDuration(duration))
        } else {
            let payload = input.read_bytes(len).unwrap_or_default().to_vec();
            Packet::new(payload, time_base)
        };
        packet.is_keyframe = true;
        Ok(ReadStatus::Packet(packet))
    }

    fn reset(&mut self) {
        self.time_base = None;
        self.resets += 1;
    }

    fn end_of_input(&mut self) {
        self.ended = true;
    }
}

/// What the container encodes for a packet: `P`, stream index, payload.
pub fn packet_record(stream: usize, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![b'P', stream as u8];
    data.extend_from_slice(payload);
    data
}

pub const HEADER_BYTES: &[u8] = b"HDR";
pub const TRAILER_BYTES: &[u8] = b"TRL";

#[derive(Debug)]
pub struct RecordingWriter {
    pub declared: Vec<Option<Rational>>,
    pub codecs: Vec<Option<(ToyCodec, Rational)>>,
    pub time_base_override: Option<Rational>,
    pub max_interleave_delta: i64,
    pub header_written: bool,
    pub trailer_written: bool,
    pub fail_header: bool,
    pub fail_writes: bool,
    pub packets: Vec<Packet>,
    pub emitted: Vec<u8>,
}

impl RecordingWriter {
    pub fn new(max_interleave_delta: i64) -> Self {
        Self {
            declared: Vec::new(),
            codecs: Vec::new(),
            time_base_override: None,
            max_interleave_delta,
            header_written: false,
            trailer_written: false,
            fail_header: false,
            fail_writes: false,
            packets: Vec::new(),
            emitted: Vec::new(),
        }
    }

    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.time_base_override = Some(time_base);
        self
    }

    fn emit(&mut self, output: &mut OutputBuffer, bytes: &[u8]) {
        output.append(bytes);
        self.emitted.extend_from_slice(bytes);
    }
}

impl ContainerWriter for RecordingWriter {
    type Codec = ToyCodec;

    fn add_stream(&mut self, framerate: Option<Rational>) -> Result<usize> {
        self.declared.push(framerate);
        self.codecs.push(None);
        Ok(self.declared.len() - 1)
    }

    fn set_stream_codec(&mut self, index: usize, codec: &ToyCodec, time_base: Rational) -> Result<()> {
        let slot = self
            .codecs
            .get_mut(index)
            .ok_or_else(|| Error::unknown_stream(index))?;
        *slot = Some((*codec, time_base));
        Ok(())
    }

    fn write_header(&mut self, output: &mut OutputBuffer) -> Result<()> {
        if self.fail_header {
            return Err(Error::header("codec not supported by container"));
        }
        self.header_written = true;
        self.emit(output, HEADER_BYTES);
        Ok(())
    }

    fn stream_time_base(&self, index: usize) -> Option<Rational> {
        self.time_base_override
            .or_else(|| self.codecs.get(index).copied().flatten().map(|(_, tb)| tb))
    }

    fn max_interleave_delta(&self) -> i64 {
        self.max_interleave_delta
    }

    fn write_packet(&mut self, packet: Packet, output: &mut OutputBuffer) -> Result<()> {
        if self.fail_writes {
            return Err(Error::write("broken pipe"));
        }
        let record = packet_record(packet.stream_index, &packet.data);
        self.emit(output, &record);
        self.packets.push(packet);
        Ok(())
    }

    fn write_trailer(&mut self, output: &mut OutputBuffer) -> Result<()> {
        self.trailer_written = true;
        self.emit(output, TRAILER_BYTES);
        Ok(())
    }
}
