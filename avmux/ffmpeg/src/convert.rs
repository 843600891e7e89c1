/*!
    Conversion utilities between FFmpeg types and avmux-types.
*/

use std::os::raw::c_int;

use ffmpeg_next::ffi;

use avmux_types::{Pts, Rational};

/// FFmpeg's marker for an unset timestamp.
pub const NO_PTS: i64 = i64::MIN;

/**
    Convert an FFmpeg rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffi::AVRational) -> Rational {
    Rational { num: r.num, den: r.den }
}

/**
    Convert our Rational to an FFmpeg rational.
*/
pub fn rational_to_ffmpeg(r: Rational) -> ffi::AVRational {
    ffi::AVRational { num: r.num, den: r.den }
}

/**
    Convert an FFmpeg timestamp, mapping the unset marker to `None`.
*/
pub fn timestamp_from_ffmpeg(ts: i64) -> Option<Pts> {
    (ts != NO_PTS).then_some(Pts(ts))
}

/**
    Convert a timestamp to FFmpeg's representation.
*/
pub fn timestamp_to_ffmpeg(ts: Option<Pts>) -> i64 {
    ts.map_or(NO_PTS, |pts| pts.0)
}

/**
    Human-readable description of an FFmpeg error code.
*/
pub fn error_message(code: c_int) -> String {
    ffmpeg_next::Error::from(code).to_string()
}

/**
    FFmpeg error code for "end of file".
*/
pub fn eof_code() -> c_int {
    c_int::from(ffmpeg_next::Error::Eof)
}

/**
    FFmpeg error code for "try again".
*/
pub fn again_code() -> c_int {
    c_int::from(ffmpeg_next::Error::Other {
        errno: ffmpeg_next::error::EAGAIN,
    })
}
