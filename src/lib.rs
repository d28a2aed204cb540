//! haul - resumable HTTP file transfer library
//!
//! This library moves single files over HTTP to local disk with support
//! for resuming interrupted transfers, live pause/resume/cancel control,
//! and throttled progress reporting.
//!
//! # Architecture
//!
//! Everything lives under one module:
//! - [`transfer`] - probe, resume planning, streaming engine, and the
//!   control surface
//!
//! The crate is a library only; embed [`TransferEngine`] in a CLI, a
//! desktop shell, or a service and drive it through [`TransferHandle`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod headers;
pub mod transfer;

// Re-export commonly used types
pub use transfer::{
    ControlFlags, HttpClient, ProgressSnapshot, ProgressTracker, RemoteMetadata, ResumePlan,
    TransferEngine, TransferError, TransferEvent, TransferHandle, TransferOutcome, TransferPhase,
    TransferRequest, plan_resume,
};
