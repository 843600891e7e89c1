/*!
    Muxer configuration types.
*/

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use avmux_types::{Error, Rational, Result, StreamType};

/**
    Container format for output.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Fragmented MP4, playable while it is being produced.
    #[default]
    FragmentedMp4,
    /// MP4 with a single movie header up front.
    ///
    /// Output is never seekable, so the index cannot be patched in by the
    /// trailer; samples are written as keyframe fragments instead.
    Mp4,
    /// Matroska container (most flexible).
    Mkv,
    /// MPEG transport stream.
    MpegTs,
}

impl ContainerFormat {
    /**
        Get the FFmpeg format name for this container.
    */
    pub fn format_name(self) -> &'static str {
        match self {
            Self::FragmentedMp4 | Self::Mp4 => "mp4",
            Self::Mkv => "matroska",
            Self::MpegTs => "mpegts",
        }
    }

    /**
        Get the typical file extension for this container.
    */
    pub fn extension(self) -> &'static str {
        match self {
            Self::FragmentedMp4 | Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::MpegTs => "ts",
        }
    }

    /**
        Options handed to the muxer when writing the header.
    */
    pub fn muxer_options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::FragmentedMp4 => &[("movflags", "frag_keyframe+empty_moov+default_base_moof")],
            Self::Mp4 => &[("movflags", "frag_keyframe+empty_moov")],
            Self::Mkv | Self::MpegTs => &[],
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FragmentedMp4 => "fmp4",
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::MpegTs => "mpegts",
        };
        f.write_str(name)
    }
}

impl FromStr for ContainerFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fmp4" | "fragmented-mp4" => Ok(Self::FragmentedMp4),
            "mp4" => Ok(Self::Mp4),
            "mkv" | "matroska" => Ok(Self::Mkv),
            "mpegts" | "ts" => Ok(Self::MpegTs),
            _ => Err(Error::unsupported_format(format!("unknown container format '{s}'"))),
        }
    }
}

/**
    Declaration of one input stream.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Name used to address the stream.
    pub name: String,
    /// Role of the stream.
    pub kind: StreamType,
    /// Nominal frame duration (1/24 for 24 fps), also the initial time base.
    /// `None` adopts the time base reported by the demuxer.
    pub framerate: Option<Rational>,
}

impl StreamConfig {
    /**
        Declare a video stream with a nominal framerate.
    */
    pub fn video(name: impl Into<String>, framerate: Rational) -> Self {
        Self {
            name: name.into(),
            kind: StreamType::Video,
            framerate: Some(framerate),
        }
    }

    /**
        Declare an audio stream timed by its demuxer.
    */
    pub fn audio(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StreamType::Audio,
            framerate: None,
        }
    }

    /**
        Set the nominal framerate.
    */
    pub fn with_framerate(mut self, framerate: Rational) -> Self {
        self.framerate = Some(framerate);
        self
    }
}

/**
    Configuration for a muxing session.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxerConfig {
    /// Container format to produce.
    pub format: ContainerFormat,
    /// Input streams, in container stream order.
    pub streams: Vec<StreamConfig>,
    /// Fraction of the container's maximum interleave delta a stream may
    /// run ahead of the slowest one.
    pub interleave_ratio: Rational,
}

impl MuxerConfig {
    /// Default share of the interleave delta usable as drift.
    pub const DEFAULT_INTERLEAVE_RATIO: Rational = Rational { num: 8, den: 10 };

    /**
        Create a new configuration without streams.
    */
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            streams: Vec::new(),
            interleave_ratio: Self::DEFAULT_INTERLEAVE_RATIO,
        }
    }

    /**
        Create configuration for fragmented MP4 output.
    */
    pub fn fragmented_mp4() -> Self {
        Self::new(ContainerFormat::FragmentedMp4)
    }

    /**
        Create configuration for MP4 output.
    */
    pub fn mp4() -> Self {
        Self::new(ContainerFormat::Mp4)
    }

    /**
        Create configuration for MKV output.
    */
    pub fn mkv() -> Self {
        Self::new(ContainerFormat::Mkv)
    }

    /**
        Create configuration for MPEG-TS output.
    */
    pub fn mpegts() -> Self {
        Self::new(ContainerFormat::MpegTs)
    }

    /**
        Add a video stream named "video".
    */
    pub fn with_video(self, framerate: Rational) -> Self {
        self.with_stream(StreamConfig::video("video", framerate))
    }

    /**
        Add an audio stream named "audio".
    */
    pub fn with_audio(self) -> Self {
        self.with_stream(StreamConfig::audio("audio"))
    }

    /**
        Add a stream.
    */
    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.streams.push(stream);
        self
    }

    /**
        Set the interleave ratio.
    */
    pub fn with_interleave_ratio(mut self, ratio: Rational) -> Self {
        self.interleave_ratio = ratio;
        self
    }

    /**
        Check the configuration, rejecting non-positive framerates, a
        non-positive interleave ratio, and duplicate stream names.
    */
    pub fn validate(&self) -> Result<()> {
        for stream in &self.streams {
            if let Some(rate) = stream.framerate {
                if !rate.is_positive() {
                    return Err(Error::InvalidFramerate {
                        num: rate.num,
                        den: rate.den,
                    });
                }
            }
        }

        let ratio = self.interleave_ratio;
        if !ratio.is_positive() {
            return Err(Error::InvalidInterleaveRatio {
                num: ratio.num,
                den: ratio.den,
            });
        }

        let mut names = HashSet::new();
        for stream in &self.streams {
            if !names.insert(stream.name.as_str()) {
                return Err(Error::invalid_data(format!(
                    "duplicate stream name '{}'",
                    stream.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self::fragmented_mp4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(ContainerFormat::FragmentedMp4.format_name(), "mp4");
        assert_eq!(ContainerFormat::Mkv.format_name(), "matroska");
        assert_eq!(ContainerFormat::MpegTs.extension(), "ts");
        assert!(ContainerFormat::Mkv.muxer_options().is_empty());
        assert_eq!(
            ContainerFormat::Mp4.muxer_options(),
            &[("movflags", "frag_keyframe+empty_moov")]
        );
        assert_eq!(
            ContainerFormat::FragmentedMp4.muxer_options(),
            &[("movflags", "frag_keyframe+empty_moov+default_base_moof")]
        );
    }

    #[test]
    fn format_parses_from_display() {
        for format in [
            ContainerFormat::FragmentedMp4,
            ContainerFormat::Mp4,
            ContainerFormat::Mkv,
            ContainerFormat::MpegTs,
        ] {
            assert_eq!(format.to_string().parse::<ContainerFormat>().unwrap(), format);
        }
        assert!(matches!(
            "avi".parse::<ContainerFormat>(),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn builder_declares_streams_in_order() {
        let config = MuxerConfig::fragmented_mp4()
            .with_video(Rational::new(1, 24))
            .with_audio();

        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.streams[0].name, "video");
        assert_eq!(config.streams[0].framerate, Some(Rational::new(1, 24)));
        assert_eq!(config.streams[1].kind, StreamType::Audio);
        assert_eq!(config.streams[1].framerate, None);
        assert_eq!(config.interleave_ratio, Rational::new(8, 10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_framerates() {
        for rate in [Rational::new(0, 24), Rational::new(-1, 24), Rational::new(1, -24)] {
            let config = MuxerConfig::mp4().with_video(rate);
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidFramerate { .. })
            ));
        }
    }

    #[test]
    fn rejects_non_positive_ratio() {
        let config = MuxerConfig::mp4()
            .with_audio()
            .with_interleave_ratio(Rational::new(0, 1));
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidInterleaveRatio { num: 0, den: 1 })
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let config = MuxerConfig::mkv().with_audio().with_audio();
        assert!(matches!(config.validate(), Err(Error::InvalidData { .. })));
    }
}
