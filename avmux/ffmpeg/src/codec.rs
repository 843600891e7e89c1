/*!
    Opaque codec parameters passed from demuxers to the container writer.
*/

use ffmpeg_next::{codec, ffi, media};

use avmux_types::{Error, Result};

/**
    Codec parameters identified by probing an elementary stream.

    Intentionally opaque to keep ffmpeg-next types out of the public API.
    [`FfmpegWriter`](crate::FfmpegWriter) copies them into the matching
    output stream before writing the container header.
*/
pub struct CodecParameters {
    parameters: codec::Parameters,
}

impl CodecParameters {
    /**
        Copy codec parameters out of an FFmpeg stream.

        # Safety

        `source` must point to valid codec parameters.
    */
    pub(crate) unsafe fn copy_from(source: *const ffi::AVCodecParameters) -> Result<Self> {
        let mut parameters = codec::Parameters::new();
        let ret = unsafe { ffi::avcodec_parameters_copy(parameters.as_mut_ptr(), source) };
        if ret < 0 {
            return Err(Error::backend(format!(
                "failed to copy codec parameters: {}",
                crate::convert::error_message(ret)
            )));
        }
        Ok(Self { parameters })
    }

    pub(crate) fn as_ptr(&self) -> *const ffi::AVCodecParameters {
        self.parameters.as_ptr()
    }

    /**
        The codec identified for the stream.
    */
    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    /**
        Whether the stream carries video, audio, or something else.
    */
    pub fn medium(&self) -> media::Type {
        self.parameters.medium()
    }
}

impl Clone for CodecParameters {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
        }
    }
}

impl std::fmt::Debug for CodecParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecParameters")
            .field("codec_id", &self.parameters.id())
            .field("medium", &self.parameters.medium())
            .finish_non_exhaustive()
    }
}
