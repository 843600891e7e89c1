/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    Type of media stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
}

impl StreamType {
    /**
        Lowercase name of the stream type, used as the default stream name.
    */
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/**
    An encoded media packet.

    Contains compressed data from a single elementary stream, with timing
    information. Packets are the unit of data between the demuxer and the
    container writer; a packet with no data is never handed to a writer.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp, `None` when the source format carries none.
    pub pts: Option<Pts>,
    /// Decode timestamp (may differ from PTS for B-frames).
    pub dts: Option<Pts>,
    /// Duration of this packet's content.
    pub duration: MediaDuration,
    /// Time base for interpreting timestamps and duration.
    pub time_base: Rational,
    /// Whether this is a keyframe (can be decoded independently).
    pub is_keyframe: bool,
    /// Index of the output stream this packet belongs to.
    pub stream_index: usize,
}

impl Packet {
    /**
        Create a new packet without timing information.
    */
    pub fn new(data: Vec<u8>, time_base: Rational) -> Self {
        Self {
            data,
            pts: None,
            dts: None,
            duration: MediaDuration::ZERO,
            time_base,
            is_keyframe: false,
            stream_index: 0,
        }
    }

    /**
        Set presentation and decode timestamps along with the duration.
    */
    pub fn with_timing(mut self, pts: Pts, dts: Pts, duration: MediaDuration) -> Self {
        self.pts = Some(pts);
        self.dts = Some(dts);
        self.duration = duration;
        self
    }

    /**
        Mark the packet as a keyframe.
    */
    pub fn with_keyframe(mut self, is_keyframe: bool) -> Self {
        self.is_keyframe = is_keyframe;
        self
    }

    /**
        Size of the packet payload in bytes.
    */
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /**
        Returns true if the packet carries no data.
    */
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Ensure Packet is Send + Sync
static_assertions::assert_impl_all!(Packet: Send, Sync);
