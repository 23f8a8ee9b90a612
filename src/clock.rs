use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Source of raw timestamps, in seconds.
pub trait TimeSource {
    fn now_seconds(&self) -> f64;
}

/// Host monotonic clock, measured from the moment the source was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven time source for tests and replays. Clones share the same
/// underlying timestamp.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    bits: Arc<AtomicU64>,
}

impl ManualTimeSource {
    pub fn new(start_seconds: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_seconds.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now_seconds() + seconds);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_seconds(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Per-session tick clock.
///
/// A reading earlier than the previous tick clamps that tick to zero and
/// re-bases on the new reading, so a stepped source costs one tick rather
/// than freezing until it catches up. Dive time is the sum of clamped deltas
/// and never decreases.
#[derive(Debug)]
pub struct DiveClock<S> {
    source: S,
    dive_start: f64,
    last_tick: f64,
    dive_time: f64,
}

impl<S: TimeSource> DiveClock<S> {
    pub fn start(source: S) -> Self {
        let now = source.now_seconds();
        Self {
            source,
            dive_start: now,
            last_tick: now,
            dive_time: 0.0,
        }
    }

    /// Returns seconds elapsed since the previous tick, clamped to zero.
    pub fn tick(&mut self) -> f64 {
        let now = self.source.now_seconds();
        if !now.is_finite() {
            warn!("Clock returned non-finite reading {}, skipping tick", now);
            return 0.0;
        }

        let elapsed = now - self.last_tick;
        self.last_tick = now;

        if elapsed < 0.0 {
            warn!("Clock went backwards by {:.3}s, clamping tick", -elapsed);
            return 0.0;
        }

        self.dive_time += elapsed;
        elapsed
    }

    pub fn dive_start(&self) -> f64 {
        self.dive_start
    }

    pub fn last_tick(&self) -> f64 {
        self.last_tick
    }

    /// Seconds of dive accumulated across all ticks.
    pub fn dive_time(&self) -> f64 {
        self.dive_time
    }
}

/// Formats a dive time as `H:MM:SS`, truncating fractional seconds.
pub fn format_dive_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
