//! Bulk retrieval of the ordered audio segments of an audiobook whose
//! segment locations are never listed anywhere. The chapter list is
//! reconstructed from two pieces of host-application state: the
//! structure tree describing the work and the per-segment access
//! tokens captured while the host loads its own data.
//!
//! ```text
//! ┌──────────────┐   observe    ┌───────────────┐
//! │ host payloads├──────────────► ParameterCell │
//! └──────────────┘              └───────┬───────┘
//! ┌──────────────┐                      │ tokens
//! │ BookManifest ├──────────────────────▼
//! └──────────────┘   extract()   ┌──────────────┐
//!                                │   BookData   │
//!                                └──────┬───────┘
//!                 DownloadService       │ chapters, in order
//!             ┌─────────────────────────▼─────────┐
//!             │ RateLimiter ── Orchestrator ──────┼──► DownloadHost
//!             │ DownloadTracker ── Persister      │    (one at a time)
//!             └───────────────────────────────────┘
//! ```
//!
//! Downloads are strictly sequential; the pacing policy in [`pace`]
//! exists to keep request cadence unremarkable, and concurrency would
//! defeat it.

pub mod download;
pub mod error;
pub mod extract;
pub mod host;
pub mod manifest;
pub mod model;
pub mod pace;
pub mod persist;
pub mod protocol;
pub mod service;
pub mod tracker;
pub mod util;

pub use download::{ChapterFailure, DownloadOrchestrator, DownloadOutcome, ProgressFn};
pub use error::{HibikiError, HibikiResult};
pub use extract::extract;
pub use host::{fs::FsDownloadHost, DownloadHost, HandleState};
pub use manifest::{wait_for_manifest, BookManifest, ParameterCell};
pub use model::{AccessParameters, BookData, BookMetadata, Chapter, TitleOverrides};
pub use pace::{RateLimiter, StealthMode};
pub use persist::MetadataPersister;
pub use service::{DownloadService, JobSummary};
pub use tracker::{DownloadRecord, DownloadStatus, DownloadTracker, WorkId};
pub use util::path::sanitize_title;
