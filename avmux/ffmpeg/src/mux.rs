/*!
    FFmpeg-backed container writer.
*/

use std::ffi::CString;
use std::os::raw::c_int;
use std::ptr;

use ffmpeg_next::ffi;

use avmux_sink::{ContainerFormat, ContainerWriter, OutputBuffer};
use avmux_types::{Error, Packet, Rational, Result};

use crate::codec::CodecParameters;
use crate::convert::{error_message, rational_from_ffmpeg, rational_to_ffmpeg, timestamp_to_ffmpeg};
use crate::io;

/// `FF_COMPLIANCE_EXPERIMENTAL`, allowing codecs the muxer flags as experimental.
const COMPLIANCE_EXPERIMENTAL: c_int = -2;

/**
    Container writer producing bytes in memory with FFmpeg.

    Output is non-seekable, so MP4 output is always fragmented. Bytes are
    flushed into the caller's output buffer after every write.
*/
pub struct FfmpegWriter {
    format: *mut ffi::AVFormatContext,
    avio: *mut ffi::AVIOContext,
    sink: *mut Vec<u8>,
    container: ContainerFormat,
    packet: *mut ffi::AVPacket,
    header_written: bool,
}

impl FfmpegWriter {
    /**
        Create a writer for the given container format.
    */
    pub fn new(container: ContainerFormat) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::backend(e.to_string()))?;

        let mut writer = Self {
            format: ptr::null_mut(),
            avio: ptr::null_mut(),
            sink: Box::into_raw(Box::default()),
            container,
            packet: ptr::null_mut(),
            header_written: false,
        };

        let name = CString::new(container.format_name())
            .map_err(|_| Error::unsupported_format(container.format_name()))?;

        unsafe {
            let ret = ffi::avformat_alloc_output_context2(
                &mut writer.format,
                ptr::null(),
                name.as_ptr(),
                ptr::null(),
            );
            if ret < 0 || writer.format.is_null() {
                return Err(Error::unsupported_format(format!(
                    "no muxer for '{}': {}",
                    container.format_name(),
                    error_message(ret)
                )));
            }

            writer.avio = io::alloc_write_context(writer.sink)?;
            (*writer.format).pb = writer.avio;
            (*writer.format).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as c_int;
            (*writer.format).strict_std_compliance = COMPLIANCE_EXPERIMENTAL;

            writer.packet = ffi::av_packet_alloc();
            if writer.packet.is_null() {
                return Err(Error::backend("failed to allocate packet"));
            }
        }

        Ok(writer)
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn is_header_written(&self) -> bool {
        self.header_written
    }

    /**
        Flush FFmpeg's I/O buffer and move everything written into `output`.
    */
    fn drain(&mut self, output: &mut OutputBuffer) {
        unsafe {
            ffi::avio_flush(self.avio);
            let written = &mut *self.sink;
            output.append(written);
            written.clear();
        }
    }

    fn stream(&self, index: usize) -> Option<*mut ffi::AVStream> {
        unsafe {
            let format = &*self.format;
            if index >= format.nb_streams as usize {
                return None;
            }
            let stream = *format.streams.add(index);
            (!stream.is_null()).then_some(stream)
        }
    }
}

impl ContainerWriter for FfmpegWriter {
    type Codec = CodecParameters;

    fn add_stream(&mut self, framerate: Option<Rational>) -> Result<usize> {
        unsafe {
            let stream = ffi::avformat_new_stream(self.format, ptr::null());
            if stream.is_null() {
                return Err(Error::backend("failed to create output stream"));
            }
            if let Some(rate) = framerate.filter(|r| r.is_positive()) {
                (*stream).time_base = rational_to_ffmpeg(rate);
                (*stream).r_frame_rate = rational_to_ffmpeg(rate.invert());
                (*stream).avg_frame_rate = rational_to_ffmpeg(rate.invert());
            }
            Ok((*stream).index as usize)
        }
    }

    fn set_stream_codec(
        &mut self,
        index: usize,
        codec: &CodecParameters,
        time_base: Rational,
    ) -> Result<()> {
        let stream = self.stream(index).ok_or_else(|| Error::unknown_stream(index))?;
        unsafe {
            let ret = ffi::avcodec_parameters_copy((*stream).codecpar, codec.as_ptr());
            if ret < 0 {
                return Err(Error::backend(format!(
                    "failed to copy codec parameters: {}",
                    error_message(ret)
                )));
            }
            // Let the muxer pick its own tag for the codec
            (*(*stream).codecpar).codec_tag = 0;
            (*stream).time_base = rational_to_ffmpeg(time_base);
        }
        Ok(())
    }

    fn write_header(&mut self, output: &mut OutputBuffer) -> Result<()> {
        let mut options: *mut ffi::AVDictionary = ptr::null_mut();
        let result = unsafe {
            for (key, value) in self.container.muxer_options() {
                let (Ok(key), Ok(value)) = (CString::new(*key), CString::new(*value)) else {
                    continue;
                };
                ffi::av_dict_set(&mut options, key.as_ptr(), value.as_ptr(), 0);
            }
            let ret = ffi::avformat_write_header(self.format, &mut options);
            ffi::av_dict_free(&mut options);
            ret
        };

        if result < 0 {
            return Err(Error::header(error_message(result)));
        }
        self.header_written = true;
        self.drain(output);
        Ok(())
    }

    fn stream_time_base(&self, index: usize) -> Option<Rational> {
        let stream = self.stream(index)?;
        let time_base = rational_from_ffmpeg(unsafe { (*stream).time_base });
        time_base.is_valid().then_some(time_base)
    }

    fn max_interleave_delta(&self) -> i64 {
        unsafe { (*self.format).max_interleave_delta }
    }

    fn write_packet(&mut self, packet: Packet, output: &mut OutputBuffer) -> Result<()> {
        if packet.is_empty() {
            return Ok(());
        }
        let size = c_int::try_from(packet.len())
            .map_err(|_| Error::write(format!("packet of {} bytes is too large", packet.len())))?;

        let ret = unsafe {
            let raw = self.packet;
            let ret = ffi::av_new_packet(raw, size);
            if ret < 0 {
                return Err(Error::write(error_message(ret)));
            }
            ptr::copy_nonoverlapping(packet.data.as_ptr(), (*raw).data, packet.len());
            (*raw).pts = timestamp_to_ffmpeg(packet.pts);
            (*raw).dts = timestamp_to_ffmpeg(packet.dts);
            (*raw).duration = packet.duration.0;
            (*raw).stream_index = packet.stream_index as c_int;
            if packet.is_keyframe {
                (*raw).flags |= ffi::AV_PKT_FLAG_KEY as c_int;
            }
            // Takes ownership of the packet's reference, leaving it blank
            ffi::av_interleaved_write_frame(self.format, raw)
        };

        if ret < 0 {
            return Err(Error::write(error_message(ret)));
        }
        self.drain(output);
        Ok(())
    }

    fn write_trailer(&mut self, output: &mut OutputBuffer) -> Result<()> {
        let ret = unsafe { ffi::av_write_trailer(self.format) };
        if ret < 0 {
            return Err(Error::trailer(error_message(ret)));
        }
        self.drain(output);
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        unsafe {
            if !self.packet.is_null() {
                ffi::av_packet_free(&mut self.packet);
            }
            if !self.format.is_null() {
                (*self.format).pb = ptr::null_mut();
                ffi::avformat_free_context(self.format);
                self.format = ptr::null_mut();
            }
            io::free_context(&mut self.avio);
            drop(Box::from_raw(self.sink));
        }
    }
}

impl std::fmt::Debug for FfmpegWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegWriter")
            .field("container", &self.container)
            .field("header_written", &self.header_written)
            .finish_non_exhaustive()
    }
}
