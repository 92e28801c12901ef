//! Monotonic and wall-clock time sources.
//!
//! The reassembly pipeline measures frame age against a monotonic clock
//! (reap/timeout sweeps) and stamps SEI NAL units with wall-clock time. Both
//! are read lazily — an idle [`Depacketizer`](crate::Depacketizer) never
//! advances its internal clock.
//!
//! Production code uses [`SystemClock`]; tests inject [`FixedClock`] to drive
//! age-based reaping deterministically instead of sleeping real time.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of monotonic and wall-clock time, in microseconds.
///
/// Mirrors the two time sources the reassembly pipeline actually needs
/// (`g_get_monotonic_time`/`g_get_real_time` in the system this crate was
/// ported from) without depending on wall-clock time for anything but SEI
/// timestamp injection.
pub trait Clock: Send + Sync {
    /// Monotonically increasing microseconds, arbitrary epoch. Used for
    /// frame age, reap, and timeout comparisons.
    fn monotonic_us(&self) -> i64;

    /// Microseconds since the Unix epoch. Used only for the SEI timestamp
    /// payload injected after each PPS.
    fn wall_us(&self) -> u64;
}

/// Real clock backed by [`Instant`] and [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock {
    start: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Some(Instant::now()),
        }
    }
}

impl Clock for SystemClock {
    fn monotonic_us(&self) -> i64 {
        let start = self.start.unwrap_or_else(Instant::now);
        Instant::now().duration_since(start).as_micros() as i64
    }

    fn wall_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_micros() as u64
    }
}

/// A clock whose readings are set explicitly, for deterministic tests of
/// age-based reaping and timeout sweeps.
#[derive(Debug, Default)]
pub struct FixedClock {
    monotonic_us: std::sync::atomic::AtomicI64,
    wall_us: std::sync::atomic::AtomicU64,
}

impl FixedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        self.monotonic_us
            .fetch_add(delta.as_micros() as i64, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set_wall_us(&self, us: u64) {
        self.wall_us.store(us, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn monotonic_us(&self) -> i64 {
        self.monotonic_us.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn wall_us(&self) -> u64 {
        self.wall_us.load(std::sync::atomic::Ordering::SeqCst)
    }
}
