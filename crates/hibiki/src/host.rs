//! The consumed host download capability.
//!
//! The orchestrator never touches the network or the filesystem
//! directly; it submits a URL plus a destination path, gets an opaque
//! handle back, and polls the handle until it settles. Anything that
//! can satisfy that contract can drive downloads.

pub mod fs;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::HibikiResult;

/// State of one submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HandleState {
    Pending,
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        resolved_path: Option<String>,
    },
    Interrupted {
        error: String,
    },
}

impl HandleState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HandleState::Pending)
    }
}

pub trait DownloadHost: Send + Sync {
    /// Opaque transfer handle. `Display` because handles cross the
    /// status-query boundary as strings.
    type Handle: Clone + Send + Sync + std::fmt::Display + 'static;

    /// Start fetching `url` into `destination` (a path relative to the
    /// host's own storage root). Returns immediately with a handle.
    fn submit(
        &self,
        url: &str,
        destination: &str,
    ) -> impl Future<Output = HibikiResult<Self::Handle>> + Send;

    /// Write caller-provided bytes to `destination`. Used for sidecar
    /// artifacts that have no remote source.
    fn submit_data(
        &self,
        data: Vec<u8>,
        destination: &str,
    ) -> impl Future<Output = HibikiResult<Self::Handle>> + Send;

    /// Look up the current state of a previously returned handle.
    fn query_state(
        &self,
        handle: &Self::Handle,
    ) -> impl Future<Output = HibikiResult<HandleState>> + Send;
}
