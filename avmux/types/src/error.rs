/*!
    Error types for the avmux crate ecosystem.
*/

use thiserror::Error;

/**
    Error type for the avmux crate ecosystem.

    Transient conditions (not enough data to identify a stream, no complete
    frame buffered yet) are never errors; they show up as ordinary return
    values. Everything here either rejects a bad configuration up front or
    ends the muxing session.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// A declared nominal framerate was zero or negative.
    #[error("invalid framerate {num}/{den}: numerator and denominator must be positive")]
    InvalidFramerate { num: i32, den: i32 },

    /// The interleave limit ratio was zero or negative.
    #[error("invalid interleave ratio {num}/{den}: numerator and denominator must be positive")]
    InvalidInterleaveRatio { num: i32, den: i32 },

    /// Stream count mismatch between configuration and collaborators.
    #[error("expected {expected} streams, got {actual}")]
    StreamCount { expected: usize, actual: usize },

    /// No stream with the given name or index exists.
    #[error("unknown stream: {stream}")]
    UnknownStream { stream: String },

    /// The container header could not be written.
    #[error("failed to write container header: {message}")]
    Header { message: String },

    /// A packet could not be written to the container.
    #[error("failed to write packet: {message}")]
    Write { message: String },

    /// The container trailer could not be written.
    #[error("failed to write container trailer: {message}")]
    Trailer { message: String },

    /// A backend resource could not be set up.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// Invalid data (malformed input)
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Unsupported format (valid but not handled)
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// An earlier fatal error ended the muxing session.
    #[error("muxing session aborted by an earlier error")]
    Aborted,
}

impl Error {
    /**
        Create an unknown stream error for a stream name or index.
    */
    pub fn unknown_stream(stream: impl ToString) -> Self {
        Self::UnknownStream {
            stream: stream.to_string(),
        }
    }

    /**
        Create a header error with the given message.
    */
    pub fn header(message: impl Into<String>) -> Self {
        Self::Header {
            message: message.into(),
        }
    }

    /**
        Create a packet write error with the given message.
    */
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /**
        Create a trailer error with the given message.
    */
    pub fn trailer(message: impl Into<String>) -> Self {
        Self::Trailer {
            message: message.into(),
        }
    }

    /**
        Create a backend error with the given message.
    */
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /**
        Create an invalid data error with the given message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /**
        Create an unsupported format error with the given message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }
}

/**
    Result type alias for the avmux crate ecosystem.
*/
pub type Result<T> = std::result::Result<T, Error>;
