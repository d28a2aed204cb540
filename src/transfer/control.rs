//! Control flags and event types shared between a transfer worker and
//! the handle its caller holds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::progress::ProgressSnapshot;

/// Pause and cancel signals for a running transfer.
///
/// Both sides hold a clone: the handle flips flags, the worker polls them
/// between chunks. Cancellation latches; once set it cannot be cleared,
/// and it overrides pause so a paused transfer still dies promptly.
#[derive(Debug, Clone, Default)]
pub struct ControlFlags {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl ControlFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a pause. No effect on a cancelled transfer.
    pub fn pause(&self) {
        if !self.is_cancelled() {
            self.paused.store(true, Ordering::SeqCst);
        }
    }

    /// Clears a pause. Idempotent; harmless on a running transfer.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Requests cancellation. Latches, and clears any pending pause so the
    /// worker's pause loop exits and observes the cancel.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Terminal result of a transfer, returned by waiting on its handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferOutcome {
    /// All bytes are on disk and the size check passed.
    Completed { path: PathBuf, bytes: u64 },
    /// Cancelled by the caller; the partial file was removed.
    Cancelled,
    /// The transfer died; the partial file is left for a future resume.
    Failed { reason: String },
}

impl TransferOutcome {
    #[must_use]
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Events broadcast to subscribers while a transfer runs.
///
/// A well-behaved transfer emits zero or more `Progress` events followed by
/// exactly one `Finished`, which is always last.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Progress(ProgressSnapshot),
    Finished(TransferOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_start_clear() {
        let flags = ControlFlags::new();
        assert!(!flags.is_paused());
        assert!(!flags.is_cancelled());
    }

    #[test]
    fn test_pause_and_resume_toggle() {
        let flags = ControlFlags::new();
        flags.pause();
        assert!(flags.is_paused());
        flags.resume();
        assert!(!flags.is_paused());
    }

    #[test]
    fn test_cancel_latches_and_clears_pause() {
        let flags = ControlFlags::new();
        flags.pause();
        flags.cancel();
        assert!(flags.is_cancelled());
        assert!(!flags.is_paused(), "cancel must release a paused worker");
        // resume after cancel must not un-cancel
        flags.resume();
        assert!(flags.is_cancelled());
    }

    #[test]
    fn test_pause_after_cancel_is_ignored() {
        let flags = ControlFlags::new();
        flags.cancel();
        flags.pause();
        assert!(!flags.is_paused(), "a cancelled transfer cannot be paused");
    }

    #[test]
    fn test_clones_share_state() {
        let flags = ControlFlags::new();
        let worker_side = flags.clone();
        flags.pause();
        assert!(worker_side.is_paused());
    }
}
