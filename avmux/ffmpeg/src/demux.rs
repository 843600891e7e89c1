/*!
    FFmpeg-backed elementary stream demuxer.
*/

use std::os::raw::c_int;
use std::ptr;

use ffmpeg_next::ffi;

use avmux_sink::{Demuxer, InputReader, ProbeStatus, ProbedStream, ReadStatus};
use avmux_types::{Error, MediaDuration, Packet, Rational, Result};

use crate::codec::CodecParameters;
use crate::convert::{again_code, eof_code, error_message, rational_from_ffmpeg, timestamp_from_ffmpeg};
use crate::io::{self, Exhaustion, PendingInput};

/**
    FFmpeg resources owned by an identified stream.
*/
struct InputSession {
    format: *mut ffi::AVFormatContext,
    avio: *mut ffi::AVIOContext,
    packet: *mut ffi::AVPacket,
    stream_index: c_int,
    time_base: Rational,
}

impl Drop for InputSession {
    fn drop(&mut self) {
        unsafe {
            if !self.packet.is_null() {
                ffi::av_packet_free(&mut self.packet);
            }
            if !self.format.is_null() {
                // Custom I/O: the AVIO context is ours to free
                ffi::avformat_close_input(&mut self.format);
            }
            io::free_context(&mut self.avio);
        }
    }
}

/**
    Demuxer identifying and reading one elementary stream with FFmpeg.

    FFmpeg reads straight from the engine's stream buffer through a custom
    AVIO context. The first stream FFmpeg detects is the one muxed.

    Until the end of input is signalled, running out of buffered bytes is
    treated as a pause rather than the end of the stream: probes that
    reach the end report [`ProbeStatus::NeedMoreData`] and FFmpeg's
    parsers keep their last partial frame. Afterwards FFmpeg sees a real
    end of file and flushes it.
*/
pub struct FfmpegDemuxer {
    // Dropped before `pending`, which it points into
    session: Option<InputSession>,
    pending: Box<PendingInput>,
    input_ended: bool,
}

impl FfmpegDemuxer {
    pub fn new() -> Self {
        Self {
            session: None,
            pending: Box::new(PendingInput::new()),
            input_ended: false,
        }
    }

    /**
        Returns true if a probe succeeded and packets can be read.
    */
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn open(&mut self) -> std::result::Result<(InputSession, CodecParameters), String> {
        ffmpeg_next::init().map_err(|e| e.to_string())?;

        let pending: *mut PendingInput = &mut *self.pending;
        let avio = unsafe { io::alloc_read_context(pending) }.map_err(|e| e.to_string())?;

        let mut session = InputSession {
            format: ptr::null_mut(),
            avio,
            packet: ptr::null_mut(),
            stream_index: 0,
            time_base: Rational::MICROSECONDS,
        };

        unsafe {
            let mut format = ffi::avformat_alloc_context();
            if format.is_null() {
                return Err("failed to allocate format context".into());
            }
            (*format).pb = session.avio;
            (*format).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as c_int;

            // Frees the context on failure
            let ret = ffi::avformat_open_input(&mut format, ptr::null(), ptr::null(), ptr::null_mut());
            if ret < 0 {
                return Err(format!("failed to open input: {}", error_message(ret)));
            }
            session.format = format;

            if (*format).nb_streams == 0 {
                return Err("no input streams detected".into());
            }

            let ret = ffi::avformat_find_stream_info(format, ptr::null_mut());
            if ret < 0 {
                return Err(format!(
                    "failed to find stream info: {}",
                    error_message(ret)
                ));
            }

            let stream = *(*format).streams;
            if stream.is_null() {
                return Err("no input streams detected".into());
            }
            session.stream_index = (*stream).index;
            session.time_base = rational_from_ffmpeg((*stream).time_base);
            if !session.time_base.is_valid() {
                return Err(format!("invalid stream time base {}", session.time_base));
            }

            let codec =
                CodecParameters::copy_from((*stream).codecpar).map_err(|e| e.to_string())?;

            session.packet = ffi::av_packet_alloc();
            if session.packet.is_null() {
                return Err("failed to allocate packet".into());
            }

            Ok((session, codec))
        }
    }
}

impl Default for FfmpegDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer for FfmpegDemuxer {
    type Codec = CodecParameters;

    fn probe(&mut self, input: &mut InputReader<'_>) -> ProbeStatus<CodecParameters> {
        self.reset();

        self.pending.begin(input.peek(), Exhaustion::EndOfFile);
        let result = self.open();
        let exhausted = self.pending.exhausted();
        input.consume(self.pending.finish());

        // A probe that ran out of bytes is judged on incomplete data, even
        // when FFmpeg settled on something, unless no more bytes can come
        match result {
            _ if exhausted && !self.input_ended => ProbeStatus::NeedMoreData,
            Ok((session, codec)) => {
                let time_base = session.time_base;
                self.session = Some(session);
                ProbeStatus::Identified(ProbedStream { time_base, codec })
            }
            Err(message) => ProbeStatus::Failed(message),
        }
    }

    fn read_packet(&mut self, input: &mut InputReader<'_>) -> Result<ReadStatus> {
        let Some(session) = &self.session else {
            return Err(Error::invalid_data("stream has not been identified"));
        };

        let on_exhausted = if self.input_ended {
            Exhaustion::EndOfFile
        } else {
            Exhaustion::TryAgain
        };
        self.pending.begin(input.peek(), on_exhausted);
        let packet = loop {
            let ret = unsafe {
                // Bytes may have arrived since the last read hit the end
                (*session.avio).eof_reached = 0;
                (*session.avio).error = 0;
                ffi::av_read_frame(session.format, session.packet)
            };

            if ret == again_code() || ret == eof_code() {
                break Ok(None);
            }
            if ret < 0 {
                break Err(Error::invalid_data(format!(
                    "failed to read packet: {}",
                    error_message(ret)
                )));
            }

            let packet = unsafe {
                let raw = &*session.packet;
                let packet = (raw.stream_index == session.stream_index)
                    .then(|| packet_from_ffmpeg(raw, session.time_base));
                ffi::av_packet_unref(session.packet);
                packet
            };
            if let Some(packet) = packet {
                break Ok(Some(packet));
            }
        };
        input.consume(self.pending.finish());

        Ok(match packet? {
            Some(packet) => ReadStatus::Packet(packet),
            None => ReadStatus::NeedMoreData,
        })
    }

    fn reset(&mut self) {
        self.session = None;
        self.pending.finish();
    }

    fn end_of_input(&mut self) {
        self.input_ended = true;
    }
}

impl std::fmt::Debug for FfmpegDemuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegDemuxer")
            .field("open", &self.is_open())
            .field("time_base", &self.session.as_ref().map(|s| s.time_base))
            .field("input_ended", &self.input_ended)
            .finish_non_exhaustive()
    }
}

/**
    Copy an FFmpeg packet into an owned packet in `time_base`.
*/
fn packet_from_ffmpeg(raw: &ffi::AVPacket, time_base: Rational) -> Packet {
    let data = if raw.data.is_null() || raw.size <= 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(raw.data, raw.size as usize) }.to_vec()
    };

    let mut packet = Packet::new(data, time_base);
    packet.pts = timestamp_from_ffmpeg(raw.pts);
    packet.dts = timestamp_from_ffmpeg(raw.dts);
    packet.duration = MediaDuration(raw.duration.max(0));
    packet.is_keyframe = raw.flags & ffi::AV_PKT_FLAG_KEY as c_int != 0;
    packet
}
