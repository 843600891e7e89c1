//! Whole-pipeline tests against the system FFmpeg libraries.
//!
//! Input elementary streams are encoded on the fly with FFmpeg's `mpeg4`
//! and `aac` encoders, then pushed through the muxer in odd-sized chunks.
//! Run with `cargo test -p avmux-ffmpeg -- --ignored`.

use ffmpeg_next::{
    ChannelLayout, Packet as FFmpegPacket, Rational as FFmpegRational, codec, encoder,
    format::{Pixel, Sample, sample::Type},
    frame,
};

use avmux_ffmpeg::{FfmpegDemuxer, FfmpegWriter};
use avmux_sink::{AvMuxer, ContainerFormat, MuxerConfig, ProbeState, Rational, SingleStreamMuxer};

const FPS_24: Rational = Rational { num: 1, den: 24 };
const VIDEO_FRAMES: usize = 48;
const AUDIO_FRAMES: usize = 86;
const SAMPLE_RATE: i32 = 44_100;
const TS_PACKET_LEN: usize = 188;

/// Chunk sizes that never line up with a frame boundary on purpose.
const CHUNK_SIZES: [usize; 4] = [37, 1021, 4093, 517];

fn odd_chunks(data: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = data;
    for size in CHUNK_SIZES.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (chunk, tail) = rest.split_at((*size).min(rest.len()));
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Raw MPEG-4 Part 2 video, 64x64 at 24 fps, one packet per frame.
fn mpeg4_stream(frames: usize) -> Vec<u8> {
    ffmpeg_next::init().unwrap();
    let codec = encoder::find(codec::Id::MPEG4).expect("mpeg4 encoder");
    let mut encoder = codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    encoder.set_width(64);
    encoder.set_height(64);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_frame_rate(Some(FFmpegRational::new(24, 1)));
    encoder.set_time_base(FFmpegRational::new(1, 24));
    encoder.set_gop(12);
    let mut encoder = encoder.open().unwrap();

    let mut stream = Vec::new();
    let mut packet = FFmpegPacket::empty();
    let mut frame = frame::Video::new(Pixel::YUV420P, 64, 64);
    for n in 0..frames {
        for plane in 0..3 {
            frame.data_mut(plane).fill((n * 5 + plane * 60) as u8);
        }
        frame.set_pts(Some(n as i64));
        encoder.send_frame(&frame).unwrap();
        while encoder.receive_packet(&mut packet).is_ok() {
            stream.extend_from_slice(packet.data().unwrap_or_default());
        }
    }
    encoder.send_eof().unwrap();
    while encoder.receive_packet(&mut packet).is_ok() {
        stream.extend_from_slice(packet.data().unwrap_or_default());
    }
    stream
}

/// ADTS header for one AAC LC frame, 44.1 kHz stereo.
fn adts_header(payload_len: usize) -> [u8; 7] {
    const PROFILE_LC: usize = 1;
    const RATE_INDEX_44100: usize = 4;
    const STEREO: usize = 2;
    let len = payload_len + 7;
    [
        0xFF,
        0xF1,
        ((PROFILE_LC << 6) | (RATE_INDEX_44100 << 2) | (STEREO >> 2)) as u8,
        (((STEREO & 3) << 6) | ((len >> 11) & 3)) as u8,
        ((len >> 3) & 0xFF) as u8,
        (((len & 7) << 5) | 0x1F) as u8,
        0xFC,
    ]
}

fn drain_adts(encoder: &mut encoder::Encoder, packet: &mut FFmpegPacket, stream: &mut Vec<u8>) {
    while encoder.receive_packet(packet).is_ok() {
        let data = packet.data().unwrap_or_default();
        stream.extend_from_slice(&adts_header(data.len()));
        stream.extend_from_slice(data);
    }
}

/// ADTS AAC audio carrying a quiet 440 Hz tone.
fn adts_aac_stream(frames: usize) -> Vec<u8> {
    ffmpeg_next::init().unwrap();
    let format = Sample::F32(Type::Planar);
    let codec = encoder::find(codec::Id::AAC).expect("aac encoder");
    let mut encoder = codec::context::Context::new_with_codec(codec)
        .encoder()
        .audio()
        .unwrap();
    encoder.set_format(format);
    encoder.set_rate(SAMPLE_RATE);
    encoder.set_channel_layout(ChannelLayout::STEREO);
    encoder.set_time_base(FFmpegRational::new(1, SAMPLE_RATE));
    encoder.set_bit_rate(128_000);
    let mut encoder = encoder.open().unwrap();

    let samples = encoder.frame_size() as usize;
    let mut frame = frame::Audio::new(format, samples, ChannelLayout::STEREO);
    frame.set_rate(SAMPLE_RATE as u32);

    let mut stream = Vec::new();
    let mut packet = FFmpegPacket::empty();

    for n in 0..frames {
        for channel in 0..2 {
            let plane = frame.data_mut(channel);
            for (i, bytes) in plane.chunks_exact_mut(4).take(samples).enumerate() {
                let t = (n * samples + i) as f32 / SAMPLE_RATE as f32;
                let value = (t * 440.0 * std::f32::consts::TAU).sin() * 0.25;
                bytes.copy_from_slice(&value.to_ne_bytes());
            }
        }
        frame.set_pts(Some((n * samples) as i64));
        encoder.send_frame(&frame).unwrap();
        drain_adts(&mut encoder, &mut packet, &mut stream);
    }
    encoder.send_eof().unwrap();
    drain_adts(&mut encoder, &mut packet, &mut stream);
    stream
}

#[test]
#[ignore = "needs system FFmpeg libraries with the mpeg4 encoder"]
fn raw_video_becomes_fragmented_mp4() {
    let video = mpeg4_stream(VIDEO_FRAMES);
    let config = MuxerConfig::fragmented_mp4().with_video(FPS_24);
    let writer = FfmpegWriter::new(ContainerFormat::FragmentedMp4).unwrap();
    let mut muxer = SingleStreamMuxer::new(config, writer, [FfmpegDemuxer::new()]).unwrap();

    let chunks = odd_chunks(&video);
    assert!(!muxer.mux(0, chunks[0]).unwrap());
    assert_eq!(muxer.container().probe_state(0), Some(ProbeState::Unprobed));

    let mut output = Vec::new();
    for chunk in &chunks[1..] {
        if muxer.mux(0, chunk).unwrap() {
            output.extend(muxer.take_output());
        }
    }

    assert!(muxer.end_of_input().unwrap());
    assert_eq!(muxer.container().probe_state(0), Some(ProbeState::Probed));
    muxer.flush().unwrap();
    assert_eq!(
        muxer.container().frame_count(0),
        Some(VIDEO_FRAMES as u64)
    );

    output.extend(muxer.take_output());
    output.extend(muxer.finish().unwrap());
    assert!(output.len() > 8);
    assert_eq!(&output[4..8], b"ftyp");
}

#[test]
#[ignore = "needs system FFmpeg libraries with the mpeg4 and aac encoders"]
fn raw_video_and_audio_become_mpeg_ts() {
    let video = mpeg4_stream(VIDEO_FRAMES);
    let audio = adts_aac_stream(AUDIO_FRAMES);
    let config = MuxerConfig::new(ContainerFormat::MpegTs)
        .with_video(FPS_24)
        .with_audio();
    let writer = FfmpegWriter::new(ContainerFormat::MpegTs).unwrap();
    let mut muxer = AvMuxer::new(config, writer, [FfmpegDemuxer::new(), FfmpegDemuxer::new()])
        .unwrap();

    let video_chunks = odd_chunks(&video);
    let audio_chunks = odd_chunks(&audio);
    let mut output = Vec::new();
    for round in 0..video_chunks.len().max(audio_chunks.len()) {
        if let Some(chunk) = video_chunks.get(round) {
            if muxer.mux_video(chunk).unwrap() {
                output.extend(muxer.take_output());
            }
        }
        if let Some(chunk) = audio_chunks.get(round) {
            if muxer.mux_audio(chunk).unwrap() {
                output.extend(muxer.take_output());
            }
        }
        if round == 0 {
            assert_eq!(muxer.container().probe_state(0), Some(ProbeState::Unprobed));
            assert_eq!(muxer.container().probe_state(1), Some(ProbeState::Unprobed));
        }
    }

    assert!(muxer.end_of_input().unwrap());
    assert_eq!(muxer.container().probe_state(0), Some(ProbeState::Probed));
    assert_eq!(muxer.container().probe_state(1), Some(ProbeState::Probed));
    muxer.flush().unwrap();
    assert!(muxer.container().frame_count(0).is_some_and(|n| n > 0));
    assert!(muxer.container().frame_count(1).is_some_and(|n| n > 0));

    output.extend(muxer.take_output());
    output.extend(muxer.finish().unwrap());
    assert!(!output.is_empty());
    assert_eq!(output[0], 0x47);
    assert_eq!(output.len() % TS_PACKET_LEN, 0);
}
