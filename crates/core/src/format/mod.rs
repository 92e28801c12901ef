//! Format dispatch: `Codec` selects the reassembly, predicate, and
//! frame-type logic a [`Frame`](crate::frame::Frame) drives packets through.
//!
//! This is the Rust stand-in for the original's vtable-of-function-pointers
//! per codec — a closed match over `Codec` plays the same role without the
//! indirection, and the compiler checks every variant is handled.

pub mod h264;
pub mod opus;

use crate::clock::Clock;
use crate::error::Result;
use crate::media::{Context, Media};

/// A supported RTP payload codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    H264,
    Opus,
}

/// Cross-packet composition state scoped to a single frame's reassembly
/// (FU-A/FU-B fragment tracking for H.264; nothing needed for Opus).
/// Freshly created at the start of every [`Frame::reassemble`](crate::frame::Frame::reassemble)
/// call — it does not survive across frames the way [`Context`] does.
#[derive(Debug)]
pub(crate) enum ComposeState {
    H264(h264::FuState),
    Opus,
}

impl ComposeState {
    pub(crate) fn new(codec: Codec) -> Self {
        match codec {
            Codec::H264 => ComposeState::H264(h264::FuState::default()),
            Codec::Opus => ComposeState::Opus,
        }
    }
}

/// Compose one packet's payload into `media`, updating `ctx` when this
/// payload carries the start of a parseable SPS or slice header.
///
/// `clock` is queried for a fresh wall-clock reading at each SEI NALU this
/// call produces (H.264 PPS units each trigger one); it is ignored for
/// Opus.
pub(crate) fn reassemble(
    codec: Codec,
    media: &mut Media,
    payload: &[u8],
    completed: bool,
    clock: &dyn Clock,
    ctx: &mut Context,
    state: &mut ComposeState,
) -> Result<()> {
    match (codec, ctx, state) {
        (Codec::H264, Context::H264(ctx), ComposeState::H264(fu_state)) => {
            h264::reassemble(media, payload, completed, ctx, clock, fu_state)
        }
        (Codec::Opus, Context::Opus(_), ComposeState::Opus) => opus::reassemble(media, payload),
        _ => unreachable!("Codec, Context, and ComposeState are always constructed together"),
    }
}

/// Does this payload, on its own, form a fragment of a larger NAL unit?
pub fn fragmented(codec: Codec, payload: &[u8]) -> bool {
    match codec {
        Codec::H264 => h264::fragmented(payload),
        Codec::Opus => opus::fragmented(payload),
    }
}

/// Is this payload the first unit of its (possibly fragmented) NAL/packet?
pub(crate) fn first_unit(codec: Codec, payload: &[u8]) -> bool {
    match codec {
        Codec::H264 => h264::first_unit(payload),
        Codec::Opus => opus::first_unit(payload),
    }
}

/// Is this payload the last unit of its (possibly fragmented) NAL/packet?
pub(crate) fn last_unit(codec: Codec, payload: &[u8]) -> bool {
    match codec {
        Codec::H264 => h264::last_unit(payload),
        Codec::Opus => opus::last_unit(payload),
    }
}

/// The codec-specific "frame type" reported on a completed [`Media`] —
/// the NAL unit type of the first H.264 NAL unit in the buffer, always `0`
/// for Opus.
pub fn frame_type(codec: Codec, media: &Media) -> u8 {
    match codec {
        Codec::H264 => h264::frame_type(media),
        Codec::Opus => opus::frame_type(media),
    }
}
