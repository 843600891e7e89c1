/*!
    Chunked feeding of input files into a muxer.
*/

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use avmux_ffmpeg::{FfmpegDemuxer, FfmpegWriter};
use avmux_sink::{AvMuxer, ContainerFormat, MuxerConfig, Rational, SingleStreamMuxer, TracingLogger};

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub format: ContainerFormat,
    pub framerate: Rational,
    pub chunk_size: usize,
}

/**
    An input file read in fixed-size chunks until it runs dry.
*/
struct ChunkedInput {
    file: File,
    buffer: Vec<u8>,
    done: bool,
}

impl ChunkedInput {
    fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            file,
            buffer: vec![0; chunk_size],
            done: false,
        })
    }

    /**
        Read the next chunk, returning `None` at end of file.
    */
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.file.read(&mut self.buffer[filled..])? {
                0 => {
                    self.done = true;
                    break;
                }
                n => filled += n,
            }
        }
        Ok((filled > 0).then(|| &self.buffer[..filled]))
    }
}

/**
    Mux a video and an audio file, alternating chunks between them.

    Returns the number of container bytes written.
*/
pub fn mux_video_audio(
    video: &Path,
    audio: &Path,
    output: &Path,
    options: &FeedOptions,
) -> Result<u64> {
    let config = MuxerConfig::new(options.format)
        .with_video(options.framerate)
        .with_audio();
    let writer = FfmpegWriter::new(options.format)?;
    let mut muxer = AvMuxer::with_logger(
        config,
        writer,
        [FfmpegDemuxer::new(), FfmpegDemuxer::new()],
        TracingLogger,
    )?;

    let mut video = ChunkedInput::open(video, options.chunk_size)?;
    let mut audio = ChunkedInput::open(audio, options.chunk_size)?;
    let mut out = OutputFile::create(output)?;

    while !(video.done && audio.done) {
        if let Some(chunk) = video.next_chunk()? {
            if muxer.mux_video(chunk)? {
                out.write(&muxer.take_output())?;
            }
        }
        if let Some(chunk) = audio.next_chunk()? {
            if muxer.mux_audio(chunk)? {
                out.write(&muxer.take_output())?;
            }
        }
        if muxer.flush()? {
            out.write(&muxer.take_output())?;
        }
    }

    if !muxer.end_of_input()? {
        bail!("no container written: not every input stream could be identified");
    }
    out.write(&muxer.finish()?)?;
    out.close()
}

/**
    Mux a video file on its own.

    Returns the number of container bytes written.
*/
pub fn mux_video(video: &Path, output: &Path, options: &FeedOptions) -> Result<u64> {
    let config = MuxerConfig::new(options.format).with_video(options.framerate);
    let writer = FfmpegWriter::new(options.format)?;
    let mut muxer =
        SingleStreamMuxer::with_logger(config, writer, [FfmpegDemuxer::new()], TracingLogger)?;

    let mut video = ChunkedInput::open(video, options.chunk_size)?;
    let mut out = OutputFile::create(output)?;

    while let Some(chunk) = video.next_chunk()? {
        if muxer.mux(0, chunk)? {
            out.write(&muxer.take_output())?;
        }
    }

    if !muxer.end_of_input()? {
        bail!("no container written: not every input stream could be identified");
    }
    out.write(&muxer.finish()?)?;
    out.close()
}

struct OutputFile {
    writer: BufWriter<File>,
    written: u64,
}

impl OutputFile {
    fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn close(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}
