//! Typed messages for the inter-context boundary.
//!
//! The transport itself (page, embedded frame, background coordinator)
//! lives outside this crate; these are only the shapes that cross it.

use serde::{Deserialize, Serialize};

use crate::{
    model::BookData,
    tracker::{DownloadRecord, WorkId},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    ExtractRequest,
    ExtractSuccess {
        data: BookData,
    },
    ExtractError {
        error: String,
    },
    StartDownload {
        data: BookData,
    },
    DownloadProgress {
        completed: usize,
        total: usize,
    },
    DownloadComplete {
        completed: usize,
        failed: usize,
        total: usize,
    },
    GetStatus {
        work_id: WorkId,
    },
    StatusReport {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record: Option<DownloadRecord>,
    },
}
