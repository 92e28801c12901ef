//! Top-level RTP-to-media-frame reassembly pipeline.
//!
//! Packets are grouped by RTP timestamp into [`Frame`]s; a frame moves to
//! the completion queue once its format's completeness predicate says so,
//! or once it has simply been waiting too long (`reap`). A separate,
//! coarser `timeout` sweep drops frames outright if they sit around far
//! longer than that — a backstop against a codec whose completeness
//! predicate never fires for some malformed stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::format::Codec;
use crate::frame::Frame;
use crate::media::{Context, Media};
use crate::packet::{compare_timestamp, Packet};

/// Reassembles a stream of RTP packets for one codec into complete media
/// frames.
///
/// Not `Sync` — a `Depacketizer` is meant to be owned by the single task
/// feeding it packets for one RTP stream (one SSRC), the same way the
/// pipeline it was ported from was single-threaded per stream.
pub struct Depacketizer {
    frames: HashMap<u32, Frame>,
    completed: Vec<Frame>,
    codec: Codec,
    enqueue_us: i64,
    refresh_us: i64,
    timeout_us: i64,
    reap_us: i64,
    context: Context,
    clock: Arc<dyn Clock>,
}

impl Depacketizer {
    /// Create a depacketizer for `codec`, using the real system clock.
    ///
    /// `timeout` bounds how long an incomplete frame is kept around at all
    /// before being discarded outright; `reap` is the shorter age at which
    /// an incomplete frame is given up on and surfaced anyway (so a
    /// consumer isn't starved waiting for a NAL unit that never arrives).
    pub fn new(codec: Codec, timeout: Duration, reap: Duration) -> Self {
        Self::with_clock(codec, timeout, reap, Arc::new(SystemClock::new()))
    }

    /// Create a depacketizer driven by an explicit [`Clock`] — tests inject
    /// a [`FixedClock`](crate::clock::FixedClock) here to exercise
    /// reap/timeout sweeps deterministically.
    pub fn with_clock(codec: Codec, timeout: Duration, reap: Duration, clock: Arc<dyn Clock>) -> Self {
        let now_us = clock.monotonic_us();
        Self {
            frames: HashMap::new(),
            completed: Vec::new(),
            codec,
            enqueue_us: now_us,
            refresh_us: now_us,
            timeout_us: timeout.as_micros() as i64,
            reap_us: reap.as_micros() as i64,
            context: Context::new(codec),
            clock,
        }
    }

    /// Parse `bytes` as one RTP datagram and add it to the stream.
    /// Returns whether a completed frame is now available via [`get_frame`](Self::get_frame).
    pub fn add_buffer(&mut self, is_audio: bool, bytes: &[u8]) -> Result<bool> {
        let created_us = self.clock.monotonic_us();
        let packet = Packet::new(bytes.to_vec(), is_audio, created_us)?;
        self.add_packet(packet)
    }

    /// Add an already-parsed RTP packet to the stream, taking ownership of
    /// it. Returns whether a completed frame is now available via
    /// [`get_frame`](Self::get_frame).
    pub fn add_packet(&mut self, packet: Packet) -> Result<bool> {
        self.enqueue_us = self.clock.monotonic_us();
        let timestamp = packet.timestamp();
        let codec = self.codec;
        let created_us = self.enqueue_us;

        let freshly_created = !self.frames.contains_key(&timestamp);
        let frame = self
            .frames
            .entry(timestamp)
            .or_insert_with(|| Frame::create(timestamp, codec, created_us));

        if let Err(e) = frame.add_packet(packet) {
            // The packet never made it into the frame. If nothing else was
            // already collected under this timestamp, there is no reason to
            // keep the empty frame around — it would otherwise sit in the
            // map until a reap/timeout sweep eventually surfaced it as a
            // junk, zero-packet `Media`.
            if freshly_created && frame.packet_count() == 0 {
                self.frames.remove(&timestamp);
            }
            return Err(e);
        }

        self.reap_completed_and_aged();

        if self.enqueue_us - self.refresh_us > self.timeout_us {
            self.discard_stale_frames();
            self.refresh_us = self.enqueue_us;
        }

        Ok(!self.completed.is_empty())
    }

    /// Reassemble the oldest completed (or reaped) frame into `media`.
    /// Returns `false` without touching `media` if none is available yet.
    pub fn get_frame(&mut self, media: &mut Media) -> Result<bool> {
        if self.completed.is_empty() {
            return Ok(false);
        }
        let mut frame = self.completed.remove(0);

        frame.reassemble(media, &mut self.context, self.clock.as_ref())?;

        if matches!(self.codec, Codec::H264) {
            media.context = self.context.clone();
        }

        Ok(true)
    }

    /// Move every frame that is either complete, or has aged past `reap`,
    /// out of `frames` and into the timestamp-ordered completion queue.
    fn reap_completed_and_aged(&mut self) {
        let enqueue_us = self.enqueue_us;
        let reap_us = self.reap_us;

        let ready: Vec<u32> = self
            .frames
            .iter()
            .filter(|(_, frame)| frame.completed() || enqueue_us - frame.created_us() > reap_us)
            .map(|(&timestamp, _)| timestamp)
            .collect();

        for timestamp in ready {
            if let Some(frame) = self.frames.remove(&timestamp) {
                trace!(timestamp, completed = frame.completed(), packets = frame.packet_count(), "reaping frame");
                self.insert_completed(frame);
            }
        }
    }

    fn insert_completed(&mut self, frame: Frame) {
        let pos = self
            .completed
            .iter()
            .position(|other| compare_timestamp(frame.timestamp(), other.timestamp()).is_lt())
            .unwrap_or(self.completed.len());
        self.completed.insert(pos, frame);
    }

    /// Periodic backstop: drop any frame that has sat in `frames` for
    /// longer than `timeout`, whether or not it was ever complete. Runs at
    /// most once per `timeout` interval rather than on every packet.
    fn discard_stale_frames(&mut self) {
        let enqueue_us = self.enqueue_us;
        let timeout_us = self.timeout_us;
        let before = self.frames.len();
        self.frames.retain(|_, frame| enqueue_us - frame.created_us() <= timeout_us);
        let dropped = before - self.frames.len();
        if dropped > 0 {
            debug!(dropped, "discarded frames older than timeout");
        }
    }
}
