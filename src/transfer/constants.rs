//! Constants for the transfer module (timeouts, polling intervals).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for slow mirrors).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum wall-clock gap between progress snapshot emissions.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep interval while a paused transfer waits to be resumed or cancelled.
///
/// Bounds cancellation latency while paused: the worker re-checks the
/// cancelled flag on every tick.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Buffered event capacity for transfer event subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
