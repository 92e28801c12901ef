//! H.264/AVC RTP payload reassembly (RFC 6184).
//!
//! Handles the three payload structures RFC 6184 defines: single NAL units
//! (types 1–12), STAP-A/B and MTAP-A/B aggregation (types 24–27), and
//! FU-A/FU-B fragmentation (types 28–29). A single user-unregistered SEI
//! NALU carrying a wall-clock timestamp is appended after every PPS we
//! compose, the way a downstream consumer might stitch RTP arrival time back
//! onto a bitstream that otherwise carries none.

use tracing::trace;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::media::{Media, Prefix};

/* 7627DFE0-4924-4084-B98D-F2C9444B8E98 */
const TIME_SYNC_UUID: [u8; 16] = [
    0x76, 0x27, 0xDF, 0xE0, 0x49, 0x24, 0x40, 0x84, 0xB9, 0x8D, 0xF2, 0xC9, 0x44, 0x4B, 0x8E, 0x98,
];

/// SPS profile_idc values for which `seq_parameter_set_id` is not coded.
/// Deduplicated from the original table (which listed 122 twice); the
/// duplicate had no behavioral effect — `!=` against the same value twice
/// just short-circuits once.
const HIGH_PROFILE_IDC: [u8; 11] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 144];

/// Parsed SPS/slice-header fields, accumulated across the packets of a
/// stream. Carried on [`Context::H264`](crate::media::Context::H264) and
/// threaded through every [`reassemble`] call for a given depacketizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct H264Context {
    pub forbidden_zero_bit: u8,
    pub nal_ref_idc: u8,
    pub nal_unit_type: u8,

    // Slice header
    pub first_mb_in_slice: u32,
    pub slice_type: u32,
    pub pic_parameter_set_id: u32,
    pub frame_num: u32,

    // SPS
    pub profile_idc: u8,
    pub constraint_set0_flag: bool,
    pub constraint_set1_flag: bool,
    pub constraint_set2_flag: bool,
    pub constraint_set3_flag: bool,
    pub reserved_zero_4bits: u8,
    pub level_idc: u8,
    pub seq_parameter_set_id: u32,
    /// `chroma_format_idc`, decoded only for high profiles (not in
    /// `HIGH_PROFILE_IDC`'s decode path below) — always `None` here, since
    /// this crate's SPS decoder follows the original's Baseline/Main field
    /// list and never reads the high-profile chroma-format block.
    pub chroma_format_idc: Option<u32>,
    /// `separate_colour_plane_flag`, paired with `chroma_format_idc` — same
    /// "never decoded on this path" caveat.
    pub separate_colour_plane_flag: Option<bool>,
    /// `colour_plane_id`, present in a slice header only when
    /// `separate_colour_plane_flag` is set — always `None`, since this
    /// crate never sets that flag.
    pub colour_plane_id: Option<u32>,
    pub log2_max_frame_num_minus4: u32,
    pub pic_order_cnt_type: u32,
    pub log2_max_pic_order_cnt_lsb_minus4: u32,
    pub delta_pic_order_always_zero_flag: bool,
    pub offset_for_non_ref_pic: i32,
    pub offset_for_top_to_bottom_field: i32,
    pub num_ref_frames_in_pic_order_cnt_cycle: u32,
    pub num_ref_frames: u32,
    pub gaps_in_frame_num_value_allowed_flag: bool,
    pub pic_width_in_mbs_minus_1: u32,
    pub pic_height_in_map_units_minus_1: u32,
    pub frame_mbs_only_flag: bool,
    pub direct_8x8_inference_flag: bool,
    pub frame_cropping_flag: bool,
    pub vui_parameters_present_flag: bool,
    pub rbsp_stop_one_bit: bool,
}

/// Cross-packet state for an in-progress FU-A/FU-B reassembly.
///
/// Tracks where the reconstructed NAL unit started in the output buffer (to
/// compute its length once the last fragment arrives) and, for AVCC output,
/// where its 4-byte length prefix was reserved.
#[derive(Debug, Default)]
pub(crate) struct FuState {
    pending: Option<FuPending>,
}

#[derive(Debug)]
struct FuPending {
    avcc_patch_pos: Option<usize>,
    unit_start: usize,
}

/// Compose one packet's H.264 payload into `media`.
///
/// `clock` is queried for a fresh wall-clock reading at each individual SEI
/// injection site — RFC 6184 aggregation permits more than one PPS (and so
/// more than one injected SEI) inside a single access unit, and each one
/// gets its own timestamp rather than a value sampled once per frame.
/// Updates `ctx` from the first NAL unit this payload carries, when that
/// unit is a slice (type 1/5) or SPS (type 7) — mirroring the original's
/// "parse context from whatever we just wrote" step, except we parse
/// directly from the bytes just composed rather than re-deriving a buffer
/// offset that assumed a prefix was always written (see `DESIGN.md`).
pub(crate) fn reassemble(
    media: &mut Media,
    payload: &[u8],
    completed: bool,
    ctx: &mut H264Context,
    clock: &dyn Clock,
    state: &mut FuState,
) -> Result<()> {
    if payload.len() <= 1 {
        return Err(Error::MalformedHeader("H.264 payload too short to carry a NAL header"));
    }

    let nal_type = payload[0] & 0x1F;

    let (decoded_type, unit_start) = match nal_type {
        1 | 5 | 6 | 7 | 8 => (nal_type, compose_single_nalu(media, payload)?),
        24 | 25 | 26 | 27 => compose_aggregation_unit(media, payload, clock)?,
        28 | 29 => compose_fragmentation_unit(media, payload, completed, state)?,
        other => return Err(Error::UnsupportedNalType(other)),
    };

    if first_unit(payload) && matches!(decoded_type, 1 | 5 | 7) {
        let unit = media.composed_since_mut(unit_start);
        match decoded_type {
            1 | 5 => decode_slice_header(unit, ctx)?,
            7 => decode_sps(unit, ctx)?,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// Compose a single NAL unit, returning the buffer position its NAL header
/// byte lands at (after whatever prefix was written).
fn compose_single_nalu(media: &mut Media, nalu: &[u8]) -> Result<usize> {
    compose_prefix_known_length(media, media.prefix, nalu.len() as u32)?;
    let unit_start = media.len();
    media.push_bytes(nalu)?;
    Ok(unit_start)
}

/// STAP-A/B, MTAP-A/B: a 1-byte aggregation header followed by a run of
/// `u16` length + NAL-unit pairs. A PPS sub-unit (type 8) triggers an SEI
/// timestamp NALU right after it, stamped with a fresh reading of `clock`
/// for every PPS encountered — an aggregation packet can legally carry more
/// than one.
fn compose_aggregation_unit(
    media: &mut Media,
    payload: &[u8],
    clock: &dyn Clock,
) -> Result<(u8, usize)> {
    let mut first: Option<(u8, usize)> = None;
    let mut i = 1usize;

    while i < payload.len() {
        if i + 2 > payload.len() {
            return Err(Error::TruncatedAggregation {
                declared: 0,
                available: payload.len() - i,
            });
        }
        let unit_len = u16::from_be_bytes([payload[i], payload[i + 1]]) as usize;
        let payload_unit_start = i + 2;
        let unit_end = payload_unit_start + unit_len;
        if unit_end > payload.len() {
            return Err(Error::TruncatedAggregation {
                declared: unit_len,
                available: payload.len() - payload_unit_start,
            });
        }

        let unit = &payload[payload_unit_start..unit_end];
        i = unit_end;
        if unit.is_empty() {
            continue;
        }

        let unit_type = unit[0] & 0x1F;
        compose_prefix_known_length(media, media.prefix, unit.len() as u32)?;
        let media_unit_start = media.len();
        media.push_bytes(unit)?;
        if first.is_none() {
            first = Some((unit_type, media_unit_start));
        }

        if unit_type == 8 {
            trace!("composing SEI timestamp NALU after aggregated PPS");
            compose_timestamp_sei_nalu(media, clock.wall_us())?;
        }
    }

    Ok(first.unwrap_or((0, media.len())))
}

/// FU-A/FU-B: reconstruct the original NAL header from the FU indicator and
/// FU header on the start fragment, then append each fragment's payload
/// bytes verbatim. For AVCC output the length prefix is reserved on the
/// start fragment and backpatched once the end fragment's bytes land,
/// rather than (as the bitstream this was ported from did) writing the
/// current fragment's own size as the AVCC length — see `DESIGN.md`.
fn compose_fragmentation_unit(
    media: &mut Media,
    payload: &[u8],
    completed: bool,
    state: &mut FuState,
) -> Result<(u8, usize)> {
    if payload.len() < 2 {
        return Err(Error::FragmentWithoutStart);
    }
    let fu_header = payload[1];
    let start = fu_header & 0x80 != 0;
    let end = fu_header & 0x40 != 0;
    let fu_type = fu_header & 0x1F;

    let unit_start = if start {
        let avcc_patch_pos = compose_prefix_reserve(media, media.prefix)?;
        let unit_start = media.len();
        let header_byte = ((!completed as u8) << 7) | (nal_ref_idc(fu_type) << 5) | fu_type;
        media.push_bytes(&[header_byte])?;
        state.pending = Some(FuPending {
            avcc_patch_pos,
            unit_start,
        });
        unit_start
    } else {
        match &state.pending {
            Some(pending) => pending.unit_start,
            None => return Err(Error::FragmentWithoutStart),
        }
    };

    media.push_bytes(&payload[2..])?;

    if end {
        if let Some(pending) = state.pending.take() {
            if let Some(patch_pos) = pending.avcc_patch_pos {
                let nal_len = (media.len() - pending.unit_start) as u32;
                media.backpatch_u32(patch_pos, nal_len);
            }
        }
    }

    Ok((fu_type, unit_start))
}

fn compose_timestamp_sei_nalu(media: &mut Media, wall_us: u64) -> Result<()> {
    const PAYLOAD_SIZE: u8 = (TIME_SYNC_UUID.len() + 8) as u8;
    let nal_len = 1 + 1 + 1 + TIME_SYNC_UUID.len() + 8 + 1;

    compose_prefix_known_length(media, media.prefix, nal_len as u32)?;
    media.push_bytes(&[0x06, 0x05, PAYLOAD_SIZE])?;
    media.push_bytes(&TIME_SYNC_UUID)?;
    media.push_bytes(&wall_us.to_be_bytes())?;
    media.push_bytes(&[0xFF])
}

fn compose_prefix_known_length(media: &mut Media, prefix: Prefix, nal_len: u32) -> Result<()> {
    match prefix {
        Prefix::None => Ok(()),
        Prefix::AnnexB => media.push_bytes(&0x0000_0001u32.to_be_bytes()),
        Prefix::Avcc => media.push_bytes(&nal_len.to_be_bytes()),
    }
}

/// Like [`compose_prefix_known_length`], but for AVCC reserves a zeroed slot
/// instead of writing a length immediately — used when the final length
/// isn't known until later fragments arrive.
fn compose_prefix_reserve(media: &mut Media, prefix: Prefix) -> Result<Option<usize>> {
    match prefix {
        Prefix::None => Ok(None),
        Prefix::AnnexB => {
            media.push_bytes(&0x0000_0001u32.to_be_bytes())?;
            Ok(None)
        }
        Prefix::Avcc => Ok(Some(media.reserve_u32()?)),
    }
}

fn nal_ref_idc(nal_unit_type: u8) -> u8 {
    match nal_unit_type {
        5 | 7 | 8 => 0x03,
        1 | 2 => 0x02,
        3 | 4 => 0x01,
        _ => 0x00,
    }
}

/// Does this payload, taken alone, form a fragment of a larger NAL unit?
pub fn fragmented(payload: &[u8]) -> bool {
    let Some(&first) = payload.first() else {
        return false;
    };
    matches!(first & 0x1F, 2 | 3 | 4 | 28 | 29)
}

pub(crate) fn first_unit(payload: &[u8]) -> bool {
    if payload.len() <= 1 {
        return false;
    }
    match payload[0] & 0x1F {
        1 | 5 | 6 | 7 | 8 | 9 => true,
        10 | 11 => false,
        12 | 24 | 25 | 26 | 27 => true,
        28 | 29 => payload[1] & 0x80 != 0,
        _ => false,
    }
}

pub(crate) fn last_unit(payload: &[u8]) -> bool {
    if payload.len() <= 1 {
        return false;
    }
    match payload[0] & 0x1F {
        1 | 5 | 6 | 7 | 8 | 9 | 10 | 11 => true,
        12 | 24 | 25 | 26 | 27 => false,
        28 | 29 => payload[1] & 0x40 != 0,
        _ => false,
    }
}

/// The NAL unit type of the first NAL unit in a reassembled buffer.
///
/// Skips the framing prefix when one was written; `Prefix::None` output has
/// no such prefix, so the header byte sits at offset 0 instead.
pub fn frame_type(media: &Media) -> u8 {
    let skip = match media.prefix {
        Prefix::None => 0,
        Prefix::AnnexB | Prefix::Avcc => 4,
    };
    media.buffer().get(skip).map(|b| b & 0x1F).unwrap_or(0)
}

/// MSB-first bit reader over a byte slice, used for Exp-Golomb decoding of
/// SPS and slice-header fields.
struct BitReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn bit_offset(&self) -> usize {
        self.offset
    }

    fn get_bit(&mut self) -> Result<u32> {
        let byte = self
            .bytes
            .get(self.offset >> 3)
            .ok_or(Error::BitstreamOverrun)?;
        let bit = (byte >> (7 - (self.offset & 0x7))) & 0x01;
        self.offset += 1;
        Ok(bit as u32)
    }

    fn get_bits(&mut self, count: usize) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..count {
            code = (code << 1) | self.get_bit()?;
        }
        Ok(code)
    }

    fn get_flag(&mut self) -> Result<bool> {
        Ok(self.get_bit()? != 0)
    }

    fn decode_uexpgolomb(&mut self) -> Result<u32> {
        let mut zeros = 0u32;
        while self.get_bit()? == 0 {
            zeros += 1;
        }
        if zeros == 0 {
            return Ok(0);
        }
        let code = self.get_bits(zeros as usize)?;
        Ok((1u32 << zeros) - 1 + code)
    }

    fn decode_sexpgolomb(&mut self) -> Result<i32> {
        let u = self.decode_uexpgolomb()?;
        let magnitude = ((u as i64 + 1) / 2) as i32;
        Ok(if u & 1 == 1 { -magnitude } else { magnitude })
    }
}

fn set_bit(bytes: &mut [u8], offset: usize) -> Result<()> {
    let byte = bytes.get_mut(offset >> 3).ok_or(Error::BitstreamOverrun)?;
    *byte |= 0x01 << (7 - (offset & 0x7));
    Ok(())
}

fn decode_slice_header(nalu: &[u8], ctx: &mut H264Context) -> Result<()> {
    let mut r = BitReader::new(nalu);
    ctx.forbidden_zero_bit = r.get_bits(1)? as u8;
    ctx.nal_ref_idc = r.get_bits(2)? as u8;
    ctx.nal_unit_type = r.get_bits(5)? as u8;
    ctx.first_mb_in_slice = r.decode_uexpgolomb()?;
    ctx.slice_type = r.decode_uexpgolomb()?;
    ctx.pic_parameter_set_id = r.decode_uexpgolomb()?;
    ctx.frame_num = r.get_bits((ctx.log2_max_frame_num_minus4 + 4) as usize)?;
    trace!(frame_num = ctx.frame_num, slice_type = ctx.slice_type, "decoded H.264 slice header");
    Ok(())
}

/// Decode an SPS, mutating `nalu` in place to force
/// `gaps_in_frame_num_value_allowed_flag` to 1 — some downstream decoders
/// otherwise refuse a stream with frame_num gaps the reassembler itself can
/// introduce by dropping incomplete frames.
fn decode_sps(nalu: &mut [u8], ctx: &mut H264Context) -> Result<()> {
    let mut r = BitReader::new(nalu);
    ctx.forbidden_zero_bit = r.get_bits(1)? as u8;
    ctx.nal_ref_idc = r.get_bits(2)? as u8;
    ctx.nal_unit_type = r.get_bits(5)? as u8;
    ctx.profile_idc = r.get_bits(8)? as u8;
    ctx.constraint_set0_flag = r.get_flag()?;
    ctx.constraint_set1_flag = r.get_flag()?;
    ctx.constraint_set2_flag = r.get_flag()?;
    ctx.constraint_set3_flag = r.get_flag()?;
    ctx.reserved_zero_4bits = r.get_bits(4)? as u8;
    ctx.level_idc = r.get_bits(8)? as u8;

    if !HIGH_PROFILE_IDC.contains(&ctx.profile_idc) {
        ctx.seq_parameter_set_id = r.decode_uexpgolomb()?;
    }
    ctx.log2_max_frame_num_minus4 = r.decode_uexpgolomb()?;
    ctx.pic_order_cnt_type = r.decode_uexpgolomb()?;
    if ctx.pic_order_cnt_type == 0 {
        ctx.log2_max_pic_order_cnt_lsb_minus4 = r.decode_uexpgolomb()?;
    } else {
        ctx.delta_pic_order_always_zero_flag = r.get_flag()?;
        ctx.offset_for_non_ref_pic = r.decode_sexpgolomb()?;
        ctx.offset_for_top_to_bottom_field = r.decode_sexpgolomb()?;
        ctx.num_ref_frames_in_pic_order_cnt_cycle = r.decode_uexpgolomb()?;
        for _ in 0..ctx.num_ref_frames_in_pic_order_cnt_cycle {
            r.decode_sexpgolomb()?;
        }
    }
    ctx.num_ref_frames = r.decode_uexpgolomb()?;

    set_bit(nalu, r.bit_offset())?;
    ctx.gaps_in_frame_num_value_allowed_flag = r.get_flag()?;

    ctx.pic_width_in_mbs_minus_1 = r.decode_uexpgolomb()?;
    ctx.pic_height_in_map_units_minus_1 = r.decode_uexpgolomb()?;
    ctx.frame_mbs_only_flag = r.get_flag()?;
    ctx.direct_8x8_inference_flag = r.get_flag()?;
    ctx.frame_cropping_flag = r.get_flag()?;
    ctx.vui_parameters_present_flag = r.get_flag()?;
    ctx.rbsp_stop_one_bit = r.get_flag()?;
    trace!(profile_idc = ctx.profile_idc, level_idc = ctx.level_idc, "decoded H.264 SPS");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::clock::FixedClock;
    use crate::format::Codec;

    fn media(prefix: Prefix) -> Media {
        Media::new(prefix, Codec::H264)
    }

    /// A clock test double that returns a fresh, incrementing wall time on
    /// every call — used to prove each SEI injection site samples
    /// independently rather than sharing one value across a whole frame.
    #[derive(Default)]
    struct SteppingClock {
        next: AtomicU64,
    }

    impl Clock for SteppingClock {
        fn monotonic_us(&self) -> i64 {
            0
        }

        fn wall_us(&self) -> u64 {
            self.next.fetch_add(1, Ordering::SeqCst)
        }
    }

    #[test]
    fn composes_single_nalu_with_annexb_prefix() {
        let mut m = media(Prefix::AnnexB);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        reassemble(&mut m, &[0x61, 0xAA, 0xBB], true, &mut ctx, &clock, &mut state).unwrap();
        assert_eq!(m.buffer(), &[0x00, 0x00, 0x00, 0x01, 0x61, 0xAA, 0xBB]);
    }

    #[test]
    fn composes_single_nalu_with_avcc_prefix() {
        let mut m = media(Prefix::Avcc);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        reassemble(&mut m, &[0x61, 0xAA, 0xBB], true, &mut ctx, &clock, &mut state).unwrap();
        assert_eq!(m.buffer(), &[0x00, 0x00, 0x00, 0x03, 0x61, 0xAA, 0xBB]);
    }

    #[test]
    fn rejects_unsupported_nal_type() {
        let mut m = media(Prefix::None);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        let err = reassemble(&mut m, &[0x02, 0xAA], true, &mut ctx, &clock, &mut state).unwrap_err();
        assert!(matches!(err, Error::UnsupportedNalType(2)));
    }

    #[test]
    fn rejects_one_byte_payload() {
        let mut m = media(Prefix::None);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        assert!(reassemble(&mut m, &[0x61], true, &mut ctx, &clock, &mut state).is_err());
    }

    #[test]
    fn stap_a_sps_pps_emits_sei_after_pps() {
        let mut m = media(Prefix::AnnexB);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        clock.set_wall_us(0x0102030405060708);
        // STAP-A header 0x18, len=4 SPS bytes, len=4 PPS bytes.
        let payload = [
            0x18, 0x00, 0x04, 0x67, 0x42, 0x00, 0x1E, 0x00, 0x04, 0x68, 0xCE, 0x3C, 0x80,
        ];
        reassemble(&mut m, &payload, true, &mut ctx, &clock, &mut state).unwrap();

        let buf = m.buffer();
        // SPS: 00 00 00 01 67 42 00 1E
        assert_eq!(&buf[0..8], &[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E]);
        // PPS: 00 00 00 01 68 CE 3C 80
        assert_eq!(&buf[8..16], &[0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80]);
        // SEI start code then payload type/size.
        assert_eq!(&buf[16..20], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(&buf[20..23], &[0x06, 0x05, 0x18]);
        assert_eq!(&buf[23..39], &TIME_SYNC_UUID);
        assert_eq!(&buf[39..47], &0x0102030405060708u64.to_be_bytes());
        assert_eq!(buf[47], 0xFF);
        assert_eq!(buf.len(), 48);
    }

    #[test]
    fn multiple_ppss_in_one_aggregation_sample_the_clock_fresh_per_sei() {
        // STAP-A carrying two PPS sub-units (RFC 6184 places no limit on how
        // many NAL units one aggregation packet may carry): each must get
        // its own SEI timestamp, not a value shared across the whole call.
        let mut m = media(Prefix::AnnexB);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = SteppingClock::default();
        let payload = [
            0x18, 0x00, 0x04, 0x68, 0xCE, 0x3C, 0x80, 0x00, 0x04, 0x68, 0xCE, 0x3C, 0x80,
        ];
        reassemble(&mut m, &payload, true, &mut ctx, &clock, &mut state).unwrap();

        let buf = m.buffer();
        assert_eq!(buf.len(), 80);
        assert_eq!(&buf[31..39], &0u64.to_be_bytes());
        assert_eq!(&buf[71..79], &1u64.to_be_bytes());
    }

    #[test]
    fn stap_a_decodes_sps_context_and_sets_gaps_flag() {
        let mut m = media(Prefix::None);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        let payload = [
            0x18, 0x00, 0x04, 0x67, 0x42, 0x00, 0x1E, 0x00, 0x04, 0x68, 0xCE, 0x3C, 0x80,
        ];
        reassemble(&mut m, &payload, true, &mut ctx, &clock, &mut state).unwrap();
        assert_eq!(ctx.profile_idc, 0x42);
        assert!(ctx.gaps_in_frame_num_value_allowed_flag);
    }

    #[test]
    fn fu_a_reassembles_across_fragments_with_avcc_backpatch() {
        let mut m = media(Prefix::Avcc);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();

        // FU indicator (type 28), FU header start=1,type=5 (I-frame), then 2 bytes of data.
        reassemble(&mut m, &[0x7C, 0x85, 0xAA, 0xBB], false, &mut ctx, &clock, &mut state).unwrap();
        // Middle fragment: FU header start=0,end=0, 2 more bytes.
        reassemble(&mut m, &[0x7C, 0x05, 0xCC, 0xDD], false, &mut ctx, &clock, &mut state).unwrap();
        // Last fragment: end=1, 1 more byte.
        reassemble(&mut m, &[0x7C, 0x45, 0xEE], true, &mut ctx, &clock, &mut state).unwrap();

        let buf = m.buffer();
        // reconstructed NAL: header(1) + AA BB + CC DD + EE = 6 bytes
        assert_eq!(&buf[0..4], &6u32.to_be_bytes());
        let reconstructed_header = buf[4];
        assert_eq!(reconstructed_header & 0x1F, 5);
        assert_eq!(&buf[5..], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
    }

    #[test]
    fn fu_without_start_fragment_is_rejected() {
        let mut m = media(Prefix::None);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        let err = reassemble(&mut m, &[0x7C, 0x05, 0xAA], false, &mut ctx, &clock, &mut state).unwrap_err();
        assert!(matches!(err, Error::FragmentWithoutStart));
    }

    #[test]
    fn truncated_aggregation_unit_is_rejected() {
        let mut m = media(Prefix::None);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        let err = reassemble(&mut m, &[0x18, 0x00, 0xFF, 0x67], true, &mut ctx, &clock, &mut state).unwrap_err();
        assert!(matches!(err, Error::TruncatedAggregation { .. }));
    }

    #[test]
    fn fragmented_predicate_matches_fu_and_data_partitions() {
        assert!(fragmented(&[0x1C])); // FU-A
        assert!(fragmented(&[0x1D])); // FU-B
        assert!(fragmented(&[0x02])); // data partition A
        assert!(!fragmented(&[0x01])); // single-unit P-frame
        assert!(!fragmented(&[]));
    }

    #[test]
    fn first_and_last_unit_gate_on_fu_header_bits() {
        assert!(first_unit(&[0x7C, 0x85]));
        assert!(!first_unit(&[0x7C, 0x05]));
        assert!(last_unit(&[0x7C, 0x45]));
        assert!(!last_unit(&[0x7C, 0x05]));
        assert!(first_unit(&[0x67, 0x42])); // SPS is always first
        assert!(last_unit(&[0x67, 0x42])); // and always last (no continuation)
    }

    #[test]
    fn frame_type_reads_first_nal_header_past_the_prefix() {
        let mut m = media(Prefix::AnnexB);
        let mut ctx = H264Context::default();
        let mut state = FuState::default();
        let clock = FixedClock::new();
        reassemble(&mut m, &[0x61, 0xAA, 0xBB], true, &mut ctx, &clock, &mut state).unwrap();
        assert_eq!(frame_type(&m), 1);
    }

    #[test]
    fn exp_golomb_decodes_consecutive_small_values() {
        // ue(0)="1", ue(1)="010", ue(2)="011" packed MSB-first: 1010 0110.
        let mut r = BitReader::new(&[0b1010_0110]);
        assert_eq!(r.decode_uexpgolomb().unwrap(), 0);
        assert_eq!(r.decode_uexpgolomb().unwrap(), 1);
        assert_eq!(r.decode_uexpgolomb().unwrap(), 2);
    }

    #[test]
    fn signed_exp_golomb_maps_odd_to_negative() {
        // ue(1)="010", ue(2)="011" -> se -1, +1.
        let mut r = BitReader::new(&[0b0100_1100]);
        assert_eq!(r.decode_sexpgolomb().unwrap(), -1);
        assert_eq!(r.decode_sexpgolomb().unwrap(), 1);
    }
}
