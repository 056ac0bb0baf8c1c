//! Per-work download state, keyed by a minted work identifier.
//!
//! Records are created when a job starts, mutated only through the
//! orchestration callbacks, and never evicted automatically; callers
//! own garbage collection of finished records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    download::DownloadOutcome,
    model::{BookData, BookMetadata},
};

pub type WorkId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub work_id: WorkId,
    pub metadata: BookMetadata,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub failed_chapters: usize,
    /// Host handles of finished transfers, in chapter order, rendered
    /// as opaque strings.
    pub handles: Vec<String>,
    pub status: DownloadStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct DownloadTracker {
    records: HashMap<WorkId, DownloadRecord>,
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a work identifier and register a fresh record for it.
    pub fn create_download(&mut self, book: &BookData) -> WorkId {
        let work_id = Uuid::new_v4().to_string();
        let record = DownloadRecord {
            work_id: work_id.clone(),
            metadata: book.metadata.clone(),
            total_chapters: book.chapters.len(),
            completed_chapters: 0,
            failed_chapters: 0,
            handles: Vec::new(),
            status: DownloadStatus::Downloading,
            started_at: Utc::now(),
            ended_at: None,
        };
        tracing::info!(work_id = %work_id, title = %book.metadata.title, "Tracking download");
        self.records.insert(work_id.clone(), record);
        work_id
    }

    /// Overwrite the counters of a record. No-op for unknown ids.
    pub fn update_progress(&mut self, work_id: &str, completed: usize, failed: usize) {
        if let Some(record) = self.records.get_mut(work_id) {
            record.completed_chapters = completed;
            record.failed_chapters = failed;
        }
    }

    /// Mark a record complete with the job's final counters.
    pub fn complete_download<H>(&mut self, work_id: &str, outcome: &DownloadOutcome<H>)
    where
        H: std::fmt::Display,
    {
        if let Some(record) = self.records.get_mut(work_id) {
            record.status = DownloadStatus::Complete;
            record.completed_chapters = outcome.completed;
            record.failed_chapters = outcome.failed;
            record.handles = outcome.handles.iter().map(|h| h.to_string()).collect();
            record.ended_at = Some(Utc::now());
        }
    }

    pub fn get_status(&self, work_id: &str) -> Option<&DownloadRecord> {
        self.records.get(work_id)
    }

    /// Explicit eviction. Nothing is removed automatically.
    pub fn remove_download(&mut self, work_id: &str) -> Option<DownloadRecord> {
        self.records.remove(work_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
