//! Transfer orchestration: probe, resume planning, streaming, and the
//! pause/resume/cancel control surface.
//!
//! A [`TransferEngine`] runs at most one transfer at a time. [`submit`]
//! validates the request, claims the active slot, and spawns a worker
//! task; the returned [`TransferHandle`] is the only way to control or
//! observe that worker.
//!
//! [`submit`]: TransferEngine::submit

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{HttpClient, RemoteMetadata};
use super::constants::{EVENT_CHANNEL_CAPACITY, PAUSE_POLL_INTERVAL};
use super::control::{ControlFlags, TransferEvent, TransferOutcome};
use super::error::TransferError;
use super::filename::resolve_filename;
use super::plan::{ResumePlan, plan_resume};
use super::progress::{ProgressSnapshot, ProgressTracker};

/// What to transfer and where to put it.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Source URL; must be http or https.
    pub url: String,
    /// Directory the file lands in. Must already exist.
    pub dest_dir: PathBuf,
    /// Explicit destination filename. When `None` the name is derived
    /// from the response headers or the URL.
    pub filename: Option<String>,
}

impl TransferRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest_dir: dest_dir.into(),
            filename: None,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Observable lifecycle phase of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// Accepted, not yet talking to the server.
    Idle,
    /// HEAD probe and resume planning in flight.
    Probing,
    /// Bytes are moving.
    Streaming,
    /// Held by a pause request; the connection stays open.
    Paused,
    Completed,
    Cancelled,
    Failed,
}

impl TransferPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Resumable HTTP transfer engine.
///
/// Cheap to clone; clones share the HTTP connection pool and the
/// single-transfer slot. Once a transfer reaches a terminal phase the
/// slot frees and the engine accepts the next submission.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    client: HttpClient,
    active: Arc<AtomicBool>,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(HttpClient::new())
    }

    /// Builds an engine around a preconfigured client (custom timeouts).
    #[must_use]
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts a transfer and returns its control handle.
    ///
    /// Rejects without side effects: a malformed or non-http(s) URL fails
    /// with [`TransferError::InvalidUrl`], and a second submission while a
    /// transfer is still running fails with [`TransferError::AlreadyActive`]
    /// without disturbing the running one.
    ///
    /// # Errors
    ///
    /// [`TransferError::InvalidUrl`], [`TransferError::AlreadyActive`].
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the worker task is
    /// spawned onto the current runtime.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub fn submit(&self, request: TransferRequest) -> Result<TransferHandle, TransferError> {
        let url = Url::parse(&request.url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| TransferError::invalid_url(&request.url))?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TransferError::AlreadyActive);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        info!(dest_dir = %request.dest_dir.display(), "transfer accepted");

        let flags = ControlFlags::new();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(TransferPhase::Idle);

        let worker = Worker {
            client: self.client.clone(),
            request,
            url,
            flags: flags.clone(),
            events: events.clone(),
            phase: phase_tx,
        };
        let join = tokio::spawn(async move {
            let _guard = guard;
            worker.run().await
        });

        Ok(TransferHandle {
            flags,
            events,
            phase_rx,
            join,
        })
    }
}

/// Frees the engine's single-transfer slot when the worker exits, however
/// it exits (including panics unwinding through the task).
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Control and observation handle for one running transfer.
#[derive(Debug)]
pub struct TransferHandle {
    flags: ControlFlags,
    events: broadcast::Sender<TransferEvent>,
    phase_rx: watch::Receiver<TransferPhase>,
    join: JoinHandle<TransferOutcome>,
}

impl TransferHandle {
    /// Pauses the transfer at the next chunk boundary. Idempotent; no
    /// effect on a terminal or cancelled transfer.
    pub fn pause(&self) {
        self.flags.pause();
    }

    /// Resumes a paused transfer. Idempotent.
    pub fn resume(&self) {
        self.flags.resume();
    }

    /// Cancels the transfer. Latches; overrides pause. The partial file is
    /// removed on a best-effort basis once the worker observes the flag.
    pub fn cancel(&self) {
        self.flags.cancel();
    }

    /// Subscribes to progress and terminal events.
    ///
    /// Each subscriber gets events from its subscription point onward. A
    /// slow subscriber that falls more than the channel capacity behind
    /// loses oldest events first, never the ordering of what it does see.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TransferPhase {
        *self.phase_rx.borrow()
    }

    /// Watch channel carrying every phase change, for callers that want to
    /// await transitions instead of polling.
    #[must_use]
    pub fn phase_watch(&self) -> watch::Receiver<TransferPhase> {
        self.phase_rx.clone()
    }

    /// Waits for the transfer to finish and returns its outcome.
    ///
    /// A worker panic is reported as a `Failed` outcome rather than
    /// propagated.
    pub async fn wait(self) -> TransferOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => TransferOutcome::Failed {
                reason: format!("transfer task aborted: {e}"),
            },
        }
    }
}

/// End of a stream loop that did not fail.
enum StreamEnd {
    Completed { path: PathBuf, bytes: u64 },
    Cancelled { path: PathBuf },
}

/// One transfer's worth of state, owned by the spawned task.
struct Worker {
    client: HttpClient,
    request: TransferRequest,
    url: Url,
    flags: ControlFlags,
    events: broadcast::Sender<TransferEvent>,
    phase: watch::Sender<TransferPhase>,
}

impl Worker {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn run(self) -> TransferOutcome {
        let outcome = match self.execute().await {
            Ok(StreamEnd::Completed { path, bytes }) => {
                info!(path = %path.display(), bytes, "transfer complete");
                TransferOutcome::Completed { path, bytes }
            }
            Ok(StreamEnd::Cancelled { path }) => {
                // Best-effort cleanup; a locked or vanished file is not an
                // additional failure on top of a deliberate cancel.
                tokio::fs::remove_file(&path).await.ok();
                info!(path = %path.display(), "transfer cancelled, partial removed");
                TransferOutcome::Cancelled
            }
            Err(e) => {
                // The partial file is left in place so a later submission
                // can resume from it.
                warn!(error = %e, "transfer failed");
                TransferOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let phase = match &outcome {
            TransferOutcome::Completed { .. } => TransferPhase::Completed,
            TransferOutcome::Cancelled => TransferPhase::Cancelled,
            TransferOutcome::Failed { .. } => TransferPhase::Failed,
        };
        // Finished is the last event a subscriber sees, after every
        // progress snapshot.
        self.events.send(TransferEvent::Finished(outcome.clone())).ok();
        let _ = self.phase.send(phase);
        outcome
    }

    async fn execute(&self) -> Result<StreamEnd, TransferError> {
        let _ = self.phase.send(TransferPhase::Probing);
        let remote = self.client.probe(self.url.as_str()).await?;

        let filename = resolve_filename(
            self.request.filename.as_deref(),
            remote.suggested_filename.as_deref(),
            &self.url,
            remote.content_type.as_deref(),
        );
        let path = self.request.dest_dir.join(&filename);

        let local_size = tokio::fs::metadata(&path).await.ok().map(|m| m.len());
        let plan = plan_resume(local_size, &remote);

        if plan.already_complete {
            info!(path = %path.display(), bytes = plan.offset, "local file already complete");
            let mut tracker = ProgressTracker::new(plan.expected_total, plan.offset);
            self.emit_progress(tracker.finalize(plan.offset));
            return Ok(StreamEnd::Completed {
                path,
                bytes: plan.offset,
            });
        }

        self.stream_to_file(&path, plan, &remote).await
    }

    /// Opens the stream and destination file, then pumps chunks.
    ///
    /// When the server answers a ranged request with a plain 200 the
    /// resume is abandoned: the plan restarts at zero and the local
    /// partial is truncated, since appending a full body would corrupt
    /// the file.
    async fn stream_to_file(
        &self,
        path: &Path,
        mut plan: ResumePlan,
        remote: &RemoteMetadata,
    ) -> Result<StreamEnd, TransferError> {
        let stream = self.client.open_stream(self.url.as_str(), plan.offset).await?;

        if plan.offset > 0 && !stream.is_partial() {
            warn!(
                offset = plan.offset,
                "server ignored range request, restarting from zero"
            );
            plan = plan.restarted();
        }

        // Unsized probe, sized GET: trust the GET body length for totals.
        let total = if plan.expected_total > 0 {
            plan.expected_total
        } else if stream.is_partial() {
            plan.offset + stream.content_length().unwrap_or(0)
        } else {
            stream.content_length().unwrap_or(0)
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(plan.append)
            .write(!plan.append)
            .truncate(!plan.append)
            .open(path)
            .await
            .map_err(|e| TransferError::filesystem(path, e))?;

        debug!(
            path = %path.display(),
            offset = plan.offset,
            total,
            resumable = remote.accepts_ranges,
            "streaming"
        );
        let _ = self.phase.send(TransferPhase::Streaming);

        let mut downloaded = plan.offset;
        let mut tracker = ProgressTracker::new(total, plan.offset);
        let mut chunks = stream.into_bytes_stream();

        while let Some(chunk) = chunks.next().await {
            if self.flags.is_cancelled() {
                drop(chunks);
                drop(file);
                return Ok(StreamEnd::Cancelled {
                    path: path.to_path_buf(),
                });
            }

            if self.flags.is_paused() && !self.hold_while_paused().await {
                drop(chunks);
                drop(file);
                return Ok(StreamEnd::Cancelled {
                    path: path.to_path_buf(),
                });
            }

            let chunk = chunk.map_err(|e| TransferError::network(self.url.as_str(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::filesystem(path, e))?;
            downloaded += chunk.len() as u64;

            if let Some(snapshot) = tracker.record(downloaded) {
                self.emit_progress(snapshot);
            }
        }

        file.flush()
            .await
            .map_err(|e| TransferError::filesystem(path, e))?;
        drop(file);

        if self.flags.is_cancelled() {
            return Ok(StreamEnd::Cancelled {
                path: path.to_path_buf(),
            });
        }

        if total > 0 && downloaded != total {
            return Err(TransferError::integrity(path, total, downloaded));
        }

        self.emit_progress(tracker.finalize(downloaded));
        Ok(StreamEnd::Completed {
            path: path.to_path_buf(),
            bytes: downloaded,
        })
    }

    /// Parks the worker while paused. Returns `false` when the pause was
    /// broken by cancellation rather than a resume.
    async fn hold_while_paused(&self) -> bool {
        let _ = self.phase.send(TransferPhase::Paused);
        debug!("paused");
        while self.flags.is_paused() {
            if self.flags.is_cancelled() {
                return false;
            }
            tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
        }
        let resumed = !self.flags.is_cancelled();
        if resumed {
            let _ = self.phase.send(TransferPhase::Streaming);
            debug!("resumed");
        }
        resumed
    }

    fn emit_progress(&self, snapshot: ProgressSnapshot) {
        // No subscribers is fine; progress is observation, not control.
        self.events.send(TransferEvent::Progress(snapshot)).ok();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_rejects_malformed_url() {
        let engine = TransferEngine::new();
        let result = engine.submit(TransferRequest::new("not a url", "/tmp"));
        assert!(
            matches!(result, Err(TransferError::InvalidUrl { .. })),
            "Expected InvalidUrl, got: {result:?}"
        );
    }

    #[test]
    fn test_submit_rejects_non_http_scheme() {
        let engine = TransferEngine::new();
        let result = engine.submit(TransferRequest::new("ftp://example.com/file", "/tmp"));
        assert!(
            matches!(result, Err(TransferError::InvalidUrl { .. })),
            "Expected InvalidUrl for ftp, got: {result:?}"
        );
    }

    #[test]
    fn test_phase_terminality() {
        assert!(TransferPhase::Completed.is_terminal());
        assert!(TransferPhase::Cancelled.is_terminal());
        assert!(TransferPhase::Failed.is_terminal());
        assert!(!TransferPhase::Streaming.is_terminal());
        assert!(!TransferPhase::Paused.is_terminal());
    }

    #[test]
    fn test_request_builder_sets_filename() {
        let request = TransferRequest::new("https://example.com/f", "/tmp")
            .with_filename("out.bin");
        assert_eq!(request.filename.as_deref(), Some("out.bin"));
    }
}
