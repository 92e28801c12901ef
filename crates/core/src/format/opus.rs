//! Opus RTP payload reassembly (RFC 7587).
//!
//! Opus carries its framing entirely in the RTP payload's TOC byte —
//! unlike H.264 there is no fragmentation across RTP packets to undo, so
//! every RTP packet maps to exactly one reassembled media frame and
//! reassembly is just an append.

use crate::error::{Error, Result};
use crate::media::Media;

/// No per-stream state is carried for Opus (the original's `unused[4]`
/// placeholder field had nothing behind it either).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpusContext;

/// TOC byte: `config:5, stereo:1, frame-count-code:2` (RFC 6716 §3.1).
fn frame_count_code(payload: &[u8]) -> Option<u8> {
    payload.first().map(|toc| toc & 0x03)
}

/// Append one Opus RTP payload to `media`.
///
/// Code-0/1/2 packets (0, 1, or 2 frames with implicit framing) pass
/// through untouched. Code-3 (arbitrary frame count with explicit sizes) is
/// not implemented.
pub(crate) fn reassemble(media: &mut Media, payload: &[u8]) -> Result<()> {
    match frame_count_code(payload) {
        None => Err(Error::EmptyInput),
        Some(3) => Err(Error::UnsupportedOpusFraming),
        Some(_) => media.push_bytes(payload),
    }
}

/// Opus packets are never fragments of a larger packet.
pub fn fragmented(_payload: &[u8]) -> bool {
    false
}

/// Opus carries no NAL-unit-like frame type; always reports 0.
pub fn frame_type(_media: &Media) -> u8 {
    0
}

pub(crate) fn first_unit(_payload: &[u8]) -> bool {
    true
}

pub(crate) fn last_unit(_payload: &[u8]) -> bool {
    true
}
