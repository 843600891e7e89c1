/*!
    Contracts for the demuxing and muxing collaborators.

    The engine never parses elementary streams or encodes containers itself.
    It drives a [`Demuxer`] per stream and a single [`ContainerWriter`],
    both of which may be backed by FFmpeg or by anything else honoring
    these contracts.
*/

use avmux_types::{Packet, Rational, Result};

use crate::buffer::InputReader;
use crate::output::OutputBuffer;

/**
    Stream parameters identified by a successful probe.
*/
#[derive(Clone, Debug)]
pub struct ProbedStream<C> {
    /// Time base the demuxer reports timestamps in.
    pub time_base: Rational,
    /// Codec parameters to hand to the container writer.
    pub codec: C,
}

/**
    Outcome of a probe attempt.
*/
#[derive(Clone, Debug)]
pub enum ProbeStatus<C> {
    /// The buffered bytes are not enough to identify the stream yet.
    NeedMoreData,
    /// The buffered bytes could not be identified (malformed data, no streams).
    Failed(String),
    /// The stream was identified.
    Identified(ProbedStream<C>),
}

/**
    Outcome of a packet read.
*/
#[derive(Clone, Debug)]
pub enum ReadStatus {
    /// The next packet, timestamped in the demuxer's native time base,
    /// or without a PTS when the format carries no timing.
    Packet(Packet),
    /// No complete packet is buffered; more input is needed.
    NeedMoreData,
}

/**
    Probe service and frame source for a single elementary stream.

    Every call receives a reader over the stream's unconsumed bytes; what the
    demuxer reads through it is consumed from the stream buffer.
*/
pub trait Demuxer {
    /// Codec parameters produced by probing.
    type Codec;

    /**
        Try to identify the stream from the buffered bytes.

        On anything but [`ProbeStatus::Identified`] the caller rewinds the
        input to where the attempt started and calls [`Demuxer::reset`].
    */
    fn probe(&mut self, input: &mut InputReader<'_>) -> ProbeStatus<Self::Codec>;

    /**
        Read the next packet from an identified stream. Must never block.
    */
    fn read_packet(&mut self, input: &mut InputReader<'_>) -> Result<ReadStatus>;

    /**
        Release everything acquired by an unsuccessful probe.

        Does not undo [`Demuxer::end_of_input`].
    */
    fn reset(&mut self);

    /**
        No more bytes will arrive. Later probes and reads must treat the
        unconsumed bytes as the whole remaining input and give up anything
        held back waiting for more, such as a final frame that is only
        complete once the next one starts.
    */
    fn end_of_input(&mut self) {}
}

/**
    Container muxing service.

    Streams are declared up front, receive codec parameters once their
    demuxer identified them, and only then is the header written.
    Every call that can produce container bytes appends them to the
    given output buffer.
*/
pub trait ContainerWriter {
    /// Codec parameters accepted for declared streams.
    type Codec;

    /**
        Declare a new stream, returning its index.
    */
    fn add_stream(&mut self, framerate: Option<Rational>) -> Result<usize>;

    /**
        Copy probed codec parameters into a declared stream.
    */
    fn set_stream_codec(&mut self, index: usize, codec: &Self::Codec, time_base: Rational)
    -> Result<()>;

    /**
        Write the container header.
    */
    fn write_header(&mut self, output: &mut OutputBuffer) -> Result<()>;

    /**
        Time base the container settled on for a stream. Containers may
        replace the requested time base while writing the header.
    */
    fn stream_time_base(&self, index: usize) -> Option<Rational>;

    /**
        Maximum time distance, in microseconds, the container tolerates
        between interleaved streams.
    */
    fn max_interleave_delta(&self) -> i64;

    /**
        Write one packet, interleaving it with the other streams.
    */
    fn write_packet(&mut self, packet: Packet, output: &mut OutputBuffer) -> Result<()>;

    /**
        Finalize the container.
    */
    fn write_trailer(&mut self, output: &mut OutputBuffer) -> Result<()>;
}
