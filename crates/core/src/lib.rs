//! # rtp-depacketizer — RTP depacketizer and media-frame reassembler
//!
//! Turns a stream of RTP packets carrying H.264 video ([RFC 6184]) or Opus
//! audio ([RFC 7587]) into complete, codec-formatted media frames ready for
//! downstream decoding or muxing.
//!
//! [RFC 6184]: https://tools.ietf.org/html/rfc6184
//! [RFC 7587]: https://tools.ietf.org/html/rfc7587
//!
//! ## Protocol references
//!
//! | RFC | Topic | How this crate uses it |
//! |-----|-------|----------------------|
//! | [RFC 3550](https://tools.ietf.org/html/rfc3550) | RTP | Packet header parsing, sequence/timestamp semantics |
//! | [RFC 6184](https://tools.ietf.org/html/rfc6184) | H.264 RTP payload | STAP/MTAP aggregation, FU-A/B fragmentation, SPS/slice-header parsing |
//! | [RFC 7587](https://tools.ietf.org/html/rfc7587) | Opus RTP payload | TOC-driven passthrough |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Depacketizer — orchestrator, public API  │
//! ├──────────────────────────────────────────┤
//! │  Frame         — per-timestamp packet set │
//! │  Format        — codec dispatch (H264/Opus)│
//! ├──────────────────────────────────────────┤
//! │  Packet        — one RTP datagram         │
//! │  Media         — reassembled output frame │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Packets feed into [`Depacketizer::add_packet`], which groups them by RTP
//! timestamp into `Frame`s. A frame becomes available once its codec-specific
//! completeness predicate is satisfied, or once it has aged past the
//! configured reap duration; [`Depacketizer::get_frame`] then drains the
//! oldest available frame into a caller-owned [`Media`] buffer.
//!
//! ## Quick start
//!
//! ```
//! use std::time::Duration;
//! use rtp_depacketizer::{Codec, Depacketizer, Media, Prefix};
//!
//! let mut dp = Depacketizer::new(Codec::H264, Duration::from_secs(2), Duration::from_millis(200));
//!
//! // version=2, marker=1, pt=96, seq=1, timestamp=1000, ssrc=1
//! let mut packet = vec![0x80, 0xE0, 0x00, 0x01, 0x00, 0x00, 0x03, 0xE8, 0, 0, 0, 1];
//! packet.extend_from_slice(&[0x61, 0xAA, 0xBB]); // single NAL unit, P-frame
//! let ready = dp.add_buffer(false, &packet).unwrap();
//! assert!(ready);
//!
//! let mut media = Media::new(Prefix::AnnexB, Codec::H264);
//! assert!(dp.get_frame(&mut media).unwrap());
//! assert_eq!(media.buffer(), &[0x00, 0x00, 0x00, 0x01, 0x61, 0xAA, 0xBB]);
//! ```
//!
//! ## Crate layout
//!
//! - [`packet`] — RTP datagram parsing and circular sequence/timestamp comparison.
//! - [`format`] — codec dispatch (`Codec::H264`/`Codec::Opus`) over the NAL
//!   composer and the Opus passthrough.
//! - [`frame`] — per-timestamp packet grouping and completeness detection.
//! - [`media`] — the reassembled output container and its codec context.
//! - [`clock`] — the monotonic/wall-clock time source driving reap/timeout.
//! - [`depacketizer`] — [`Depacketizer`], the top-level orchestrator.
//! - [`error`] — [`Error`] and [`Result`].

pub mod clock;
pub mod depacketizer;
pub mod error;
pub mod format;
mod frame;
pub mod media;
pub mod packet;

pub use clock::{Clock, FixedClock, SystemClock};
pub use depacketizer::Depacketizer;
pub use error::{Error, Result};
pub use format::Codec;
pub use media::{Context, Media, Prefix};
pub use packet::Packet;
