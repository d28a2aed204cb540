//! Resume planning: pure decision logic for how a transfer should start.
//!
//! Given what is already on disk and what the probe learned about the
//! remote resource, [`plan_resume`] decides the starting offset and the
//! file open mode. No I/O happens here.

use tracing::debug;

use super::client::RemoteMetadata;

/// How to open the destination file and where to start in the remote body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    /// Byte offset to request from the server. Zero means a full fetch.
    pub offset: u64,
    /// Whether to append to the existing file. When false the file is
    /// created or truncated.
    pub append: bool,
    /// Total expected size of the complete resource, zero when unknown.
    pub expected_total: u64,
    /// The local copy already holds every byte of the resource.
    pub already_complete: bool,
}

impl ResumePlan {
    /// A full fetch from byte zero, truncating any local partial.
    #[must_use]
    pub fn full_fetch(expected_total: u64) -> Self {
        Self {
            offset: 0,
            append: false,
            expected_total,
            already_complete: false,
        }
    }

    /// Downgrades this plan to a full fetch, keeping the expected total.
    ///
    /// Used when the server ignores a range request and sends the whole
    /// body with a 200 anyway.
    #[must_use]
    pub fn restarted(self) -> Self {
        Self::full_fetch(self.expected_total)
    }
}

/// Decides where a transfer starts given local and remote state.
///
/// Resume requires all three of: a local partial file, a known remote
/// total, and server range support. A local file at least as large as the
/// remote total is treated as already complete. In every other case the
/// plan is a full fetch that truncates whatever is on disk, so a stale
/// partial can never be appended to twice.
#[must_use]
pub fn plan_resume(local_size: Option<u64>, remote: &RemoteMetadata) -> ResumePlan {
    // A reported total of zero is as good as no total. The probe already
    // normalizes this, but the planner is public and must not let
    // `Some(0)` mark every local file already complete.
    let remote_total = remote.total_size.filter(|t| *t > 0);
    let total = remote_total.unwrap_or(0);

    let plan = match (local_size, remote_total) {
        (Some(existing), Some(total)) if existing >= total => ResumePlan {
            offset: existing,
            append: true,
            expected_total: total,
            already_complete: true,
        },
        (Some(existing), Some(total)) if existing > 0 && remote.accepts_ranges => ResumePlan {
            offset: existing,
            append: true,
            expected_total: total,
            already_complete: false,
        },
        _ => ResumePlan::full_fetch(total),
    };

    debug!(
        offset = plan.offset,
        append = plan.append,
        expected_total = plan.expected_total,
        already_complete = plan.already_complete,
        "resume plan"
    );
    plan
}
