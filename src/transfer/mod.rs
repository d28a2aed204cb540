//! Resumable HTTP transfer engine.
//!
//! A transfer moves one remote resource to one local file, surviving
//! interruption: the engine probes the server, compares the remote size
//! against what is already on disk, and requests only the missing suffix
//! when the server supports byte ranges. A running transfer can be
//! paused, resumed, and cancelled through its handle, and reports
//! throttled progress snapshots to any number of subscribers.
//!
//! ```no_run
//! use haul::{TransferEngine, TransferRequest};
//!
//! # async fn demo() {
//! let engine = TransferEngine::new();
//! let handle = engine
//!     .submit(TransferRequest::new(
//!         "https://example.com/disk.iso",
//!         "/tmp/downloads",
//!     ))
//!     .unwrap();
//!
//! let mut events = handle.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! });
//!
//! let outcome = handle.wait().await;
//! println!("{outcome:?}");
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod control;
pub mod engine;
pub mod error;
mod filename;
pub mod plan;
pub mod progress;

pub use client::{HttpClient, RemoteMetadata, TransferStream};
pub use control::{ControlFlags, TransferEvent, TransferOutcome};
pub use engine::{TransferEngine, TransferHandle, TransferPhase, TransferRequest};
pub use error::TransferError;
pub use plan::{ResumePlan, plan_resume};
pub use progress::{ProgressSnapshot, ProgressTracker};
