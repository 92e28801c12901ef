//! Error types for the RTP depacketizer library.

/// Errors that can occur while depacketizing RTP into media frames.
///
/// Variants map to the failure modes described in the reassembly pipeline:
///
/// - **Validation**: [`EmptyInput`](Self::EmptyInput),
///   [`TimestampMismatch`](Self::TimestampMismatch),
///   [`UnsupportedNalType`](Self::UnsupportedNalType),
///   [`UnsupportedOpusFraming`](Self::UnsupportedOpusFraming) — caller gave
///   this packet a shape the format doesn't accept.
/// - **Malformed**: [`TruncatedAggregation`](Self::TruncatedAggregation),
///   [`FragmentWithoutStart`](Self::FragmentWithoutStart),
///   [`BitstreamOverrun`](Self::BitstreamOverrun) — the payload bytes
///   themselves don't parse.
/// - **Resource**: [`BufferOverflow`](Self::BufferOverflow) — the `Media`
///   output buffer is too small for the reassembled frame.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `add_buffer` or `Packet::create` was given a zero-length buffer.
    #[error("empty RTP buffer")]
    EmptyInput,

    /// An RTP packet's header could not be parsed (buffer shorter than the
    /// fixed 12-byte header, or shorter than the CSRC/extension/padding it
    /// declares).
    #[error("malformed RTP header: {0}")]
    MalformedHeader(&'static str),

    /// `Frame::add_packet` was given a packet whose RTP timestamp does not
    /// match the frame it is being added to.
    #[error("packet timestamp {packet} does not match frame timestamp {frame}")]
    TimestampMismatch { frame: u32, packet: u32 },

    /// The RTP payload's NAL unit type is not one this crate reassembles
    /// (RFC 6184 types 1–12, 24–29 are supported).
    #[error("unsupported H.264 NAL unit type {0}")]
    UnsupportedNalType(u8),

    /// Opus TOC `count == 3` (self-delimited code-3 framing) is not
    /// implemented.
    #[error("unsupported Opus TOC framing (code-3 self-delimited packets)")]
    UnsupportedOpusFraming,

    /// A STAP/MTAP aggregation unit's 2-byte length prefix claims more bytes
    /// than remain in the payload.
    #[error("truncated aggregation unit: declared length {declared} exceeds {available} remaining bytes")]
    TruncatedAggregation { declared: usize, available: usize },

    /// An FU-A/FU-B fragment arrived whose start bit was never seen for this
    /// frame (or whose payload is too short to carry an FU header).
    #[error("fragmentation unit without a preceding start fragment")]
    FragmentWithoutStart,

    /// The Exp-Golomb/bitstream reader ran past the end of the NAL unit it
    /// was decoding.
    #[error("bitstream reader ran past end of NAL unit")]
    BitstreamOverrun,

    /// Composing the next unit would write past `Media`'s buffer capacity.
    #[error("reassembled frame exceeds media buffer capacity ({limit} bytes)")]
    BufferOverflow { limit: usize },

    /// Allocation failure. Kept for parity with the failure modes this
    /// crate's contract documents, but unreachable from this crate's own
    /// safe code paths — Rust's global allocator aborts on failure rather
    /// than returning a recoverable error from an infallible `Vec` push, and
    /// nothing here reaches for `try_reserve` given the bounded allocation
    /// sizes involved (a 512 KiB `Media` buffer, RTP-datagram-sized
    /// packets). A caller embedding this crate behind a custom allocator
    /// could still construct it.
    #[error("allocation failure")]
    NoResources,
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
