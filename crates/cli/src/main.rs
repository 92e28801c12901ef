//! Standalone CLI that drives [`rtp_depacketizer::Depacketizer`] over a
//! recorded RTP capture and prints the reassembled frame metadata.
//!
//! Capture format: a sequence of `(u32 length, [u8; length])` records, each
//! holding one raw RTP datagram in arrival order — the simplest framing that
//! lets this tool replay a capture without parsing pcap/pcapng.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rtp_depacketizer::{Codec, Depacketizer, Media, Prefix};

#[derive(Parser)]
#[command(
    name = "rtp-depacketize",
    about = "Reassemble a recorded RTP capture into media frames"
)]
struct Args {
    /// Path to a length-prefixed RTP packet capture.
    capture: PathBuf,

    /// Codec carried by the capture.
    #[arg(long, value_enum, default_value_t = CodecArg::H264)]
    codec: CodecArg,

    /// NAL framing for H.264 output (ignored for Opus).
    #[arg(long, value_enum, default_value_t = PrefixArg::AnnexB)]
    prefix: PrefixArg,

    /// Discard an incomplete frame after this many milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Surface an incomplete frame anyway after this many milliseconds.
    #[arg(long, default_value_t = 200)]
    reap_ms: u64,

    /// Treat the capture as an audio stream (sets `is_audio` on each packet).
    #[arg(long)]
    audio: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    H264,
    Opus,
}

impl From<CodecArg> for Codec {
    fn from(value: CodecArg) -> Self {
        match value {
            CodecArg::H264 => Codec::H264,
            CodecArg::Opus => Codec::Opus,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PrefixArg {
    None,
    AnnexB,
    Avcc,
}

impl From<PrefixArg> for Prefix {
    fn from(value: PrefixArg) -> Self {
        match value {
            PrefixArg::None => Prefix::None,
            PrefixArg::AnnexB => Prefix::AnnexB,
            PrefixArg::Avcc => Prefix::Avcc,
        }
    }
}

/// Read one `(u32 length, bytes)` record. `Ok(None)` on a clean EOF between
/// records.
fn read_record(reader: &mut impl Read) -> io::Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(Some(bytes))
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let codec: Codec = args.codec.into();
    let prefix: Prefix = args.prefix.into();

    let mut dp = Depacketizer::new(
        codec,
        Duration::from_millis(args.timeout_ms),
        Duration::from_millis(args.reap_ms),
    );
    let mut media = Media::new(prefix, codec);

    let file = File::open(&args.capture)?;
    let mut reader = BufReader::new(file);

    let mut packet_count = 0usize;
    let mut frame_count = 0usize;
    while let Some(bytes) = read_record(&mut reader)? {
        packet_count += 1;
        if let Err(e) = dp.add_buffer(args.audio, &bytes) {
            eprintln!("warning: dropping malformed packet: {e}");
            continue;
        }

        loop {
            match dp.get_frame(&mut media) {
                Ok(true) => {
                    frame_count += 1;
                    println!(
                        "frame {frame_count}: rtptime={} seq=[{},{}] type={} bytes={}",
                        media.rtptime,
                        media.head_seq,
                        media.tail_seq,
                        media.frame_type,
                        media.buffer().len()
                    );
                }
                Ok(false) => break,
                Err(e) => {
                    eprintln!("warning: failed to reassemble frame: {e}");
                    break;
                }
            }
        }
    }

    eprintln!("read {packet_count} packets, reassembled {frame_count} frames");
    Ok(())
}
