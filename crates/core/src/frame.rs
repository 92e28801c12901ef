//! A single access unit: a run of RTP packets sharing one RTP timestamp,
//! collected until they can be reassembled into one [`Media`] buffer.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::format::{self, Codec, ComposeState};
use crate::media::{Context, Media};
use crate::packet::{compare_sequence, Packet};

/// One timestamp's worth of RTP packets, in flight until
/// [`Frame::completed`] or reaped for being too old.
#[derive(Debug)]
pub(crate) struct Frame {
    packets: Vec<Packet>,
    codec: Codec,
    created_us: i64,
    timestamp: u32,
    marker: bool,
    completed: bool,
}

impl Frame {
    pub(crate) fn create(timestamp: u32, codec: Codec, created_us: i64) -> Self {
        Self {
            packets: Vec::new(),
            codec,
            created_us,
            timestamp,
            marker: false,
            completed: false,
        }
    }

    pub(crate) fn created_us(&self) -> i64 {
        self.created_us
    }

    pub(crate) fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub(crate) fn completed(&self) -> bool {
        self.completed
    }

    pub(crate) fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Add a packet belonging to this frame's timestamp. Once the RTP
    /// marker bit is seen (or the format's own `last_unit` predicate says
    /// so), the queue is sequence-ordered and checked for completeness.
    /// Returns the frame's completeness state after the add.
    pub(crate) fn add_packet(&mut self, packet: Packet) -> Result<bool> {
        if packet.timestamp() != self.timestamp {
            return Err(Error::TimestampMismatch {
                frame: self.timestamp,
                packet: packet.timestamp(),
            });
        }

        let is_last = packet.marker() || format::last_unit(self.codec, packet.payload()?);
        self.packets.push(packet);

        if is_last {
            self.marker = true;
            if self.packets.len() > 1 {
                self.packets
                    .sort_by(|a, b| compare_sequence(a.sequence(), b.sequence()));
            }
            self.completed = self.check_completeness()?;
        }

        Ok(self.completed)
    }

    /// First unit of the (sorted) queue parses as a first unit, last as a
    /// last unit, and — for more than one packet — every consecutive pair
    /// of sequence numbers is contiguous modulo 2^16.
    ///
    /// Contiguity is checked directly pairwise rather than against a
    /// `prev == 0` sentinel for "not yet seen": a real previous sequence
    /// number of 0 is indistinguishable from "uninitialized" under that
    /// sentinel, which would let a frame with an actual gap look complete
    /// (see `DESIGN.md`).
    fn check_completeness(&self) -> Result<bool> {
        let head = self.packets.first().expect("non-empty: called after push");
        let tail = self.packets.last().expect("non-empty: called after push");

        if !format::first_unit(self.codec, head.payload()?) {
            return Ok(false);
        }
        if !format::last_unit(self.codec, tail.payload()?) {
            return Ok(false);
        }
        if self.packets.len() == 1 {
            return Ok(!format::fragmented(self.codec, head.payload()?));
        }

        for pair in self.packets.windows(2) {
            if pair[1].sequence() != pair[0].sequence().wrapping_add(1) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drain the (already sequence-ordered) packet queue into `media`,
    /// dispatching each payload through the codec's reassembly logic and
    /// updating `ctx` from whatever SPS/slice header it parses out.
    ///
    /// `clock` is sampled fresh at every SEI NALU H.264 composition emits —
    /// a frame whose packets carry more than one PPS (legal under RFC 6184
    /// aggregation) gets one independently-timestamped SEI per PPS, not one
    /// value shared across the whole frame.
    pub(crate) fn reassemble(
        &mut self,
        media: &mut Media,
        ctx: &mut Context,
        clock: &dyn Clock,
    ) -> Result<()> {
        media.reset();
        let mut state = ComposeState::new(self.codec);

        for (index, packet) in self.packets.drain(..).enumerate() {
            let payload = packet.payload()?;
            if index == 0 {
                media.head_seq = packet.sequence();
            }
            format::reassemble(self.codec, media, payload, self.completed, clock, ctx, &mut state)?;
            media.tail_seq = packet.sequence();
        }

        media.is_audio = matches!(self.codec, Codec::Opus);
        media.frame_type = format::frame_type(self.codec, media);
        media.created_us = self.created_us;
        media.rtptime = self.timestamp;
        Ok(())
    }
}
