//! The per-work metadata sidecar.
//!
//! One `metadata.json` per completed work, written through the same
//! host capability and into the same sanitized folder as the chapter
//! files. A failed sidecar write is surfaced to the caller but never
//! rolls back the chapter results already reported.

use std::time::Duration;

use serde::Serialize;

use crate::{
    error::{HibikiError, HibikiResult},
    host::{DownloadHost, HandleState},
    model::{BookMetadata, Chapter},
    util::path::sanitize_title,
};

#[derive(Serialize)]
struct Sidecar<'a> {
    metadata: &'a BookMetadata,
    chapters: &'a [Chapter],
}

pub struct MetadataPersister {
    poll_interval: Duration,
    settle_timeout: Duration,
}

impl Default for MetadataPersister {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            settle_timeout: Duration::from_secs(30),
        }
    }
}

impl MetadataPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `{metadata, chapters}` and write it to
    /// `<destination_key>/metadata.json`, waiting for the handle to
    /// settle.
    pub async fn save<H>(
        &self,
        host: &H,
        metadata: &BookMetadata,
        chapters: &[Chapter],
        destination_key: &str,
    ) -> HibikiResult<H::Handle>
    where
        H: DownloadHost,
    {
        let destination = format!("{}/metadata.json", sanitize_title(destination_key));
        let payload = serde_json::to_vec_pretty(&Sidecar { metadata, chapters })?;

        let handle = host.submit_data(payload, &destination).await?;

        let deadline = tokio::time::Instant::now() + self.settle_timeout;
        loop {
            match host.query_state(&handle).await? {
                HandleState::Complete { .. } => {
                    tracing::info!(destination = %destination, "Metadata sidecar saved");
                    return Ok(handle);
                }
                HandleState::Interrupted { error } => {
                    return Err(HibikiError::HostRejected(error));
                }
                HandleState::Pending => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(HibikiError::SidecarStalled);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
