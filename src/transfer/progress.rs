//! Progress tracking: rate-limited snapshots with instantaneous speed.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::constants::PROGRESS_INTERVAL;

/// A point-in-time view of a running transfer.
///
/// Snapshots within one transfer are monotonic: `downloaded` never
/// decreases from one snapshot to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Bytes written to disk so far, including any resumed prefix.
    pub downloaded: u64,
    /// Total expected bytes, zero when the server did not report a size.
    pub total: u64,
    /// Instantaneous transfer rate in bytes per second, measured over the
    /// window since the previous snapshot.
    pub speed_bps: f64,
}

impl ProgressSnapshot {
    /// Completed fraction in `[0.0, 1.0]`, or `None` when total is unknown.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some((self.downloaded as f64 / self.total as f64).min(1.0))
    }
}

/// Emission throttle and speed window for one transfer.
///
/// `record` is called once per received chunk and decides whether enough
/// time has passed to emit; `finalize` produces the last snapshot of a
/// transfer unconditionally so observers always see the final byte count.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    interval: Duration,
    last_emit: Option<Instant>,
    sample_at: Instant,
    sample_bytes: u64,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(total: u64, starting_bytes: u64) -> Self {
        Self {
            total,
            interval: PROGRESS_INTERVAL,
            last_emit: None,
            sample_at: Instant::now(),
            sample_bytes: starting_bytes,
        }
    }

    /// Records the current byte count, emitting a snapshot when the
    /// throttle interval has elapsed since the previous emission.
    ///
    /// The first call always emits, so observers see an initial snapshot
    /// as soon as bytes start flowing.
    pub fn record(&mut self, downloaded: u64) -> Option<ProgressSnapshot> {
        let now = Instant::now();
        let due = match self.last_emit {
            None => true,
            Some(at) => now.duration_since(at) >= self.interval,
        };
        if !due {
            return None;
        }
        Some(self.emit(downloaded, now))
    }

    /// Produces the terminal snapshot, bypassing the throttle.
    pub fn finalize(&mut self, downloaded: u64) -> ProgressSnapshot {
        self.emit(downloaded, Instant::now())
    }

    fn emit(&mut self, downloaded: u64, now: Instant) -> ProgressSnapshot {
        let elapsed = now.duration_since(self.sample_at).as_secs_f64();
        let window_bytes = downloaded.saturating_sub(self.sample_bytes);
        // Sub-millisecond windows would produce absurd rates; report zero
        // instead of dividing by (near) nothing.
        #[allow(clippy::cast_precision_loss)]
        let speed_bps = if elapsed > 0.001 {
            window_bytes as f64 / elapsed
        } else {
            0.0
        };

        self.last_emit = Some(now);
        self.sample_at = now;
        self.sample_bytes = downloaded;

        ProgressSnapshot {
            downloaded,
            total: self.total,
            speed_bps,
        }
    }
}
