//! Sequential materialization of a chapter list.
//!
//! Chapters are processed strictly in array order, one transfer at a
//! time. Concurrency here would defeat the pacing policy, so there is
//! none: every suspension is either a rate-limiter delay or a poll wait
//! on the host capability. A single chapter's failure is isolated and
//! never aborts the job.

use std::time::Duration;

use serde::Serialize;

use crate::{
    error::{HibikiError, HibikiResult},
    host::{DownloadHost, HandleState},
    model::Chapter,
    pace::RateLimiter,
    util::path::sanitize_title,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Bound on the per-segment poll wait. A handle that never settles
/// counts as that chapter's failure instead of stalling the whole job.
pub const DEFAULT_SEGMENT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterFailure {
    pub chapter_index: u32,
    pub error: String,
}

/// Aggregate result of one job. `completed + failed == total` always
/// holds once `download_all` returns.
#[derive(Debug, Clone)]
pub struct DownloadOutcome<H> {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub handles: Vec<H>,
    pub errors: Vec<ChapterFailure>,
}

pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

pub struct DownloadOrchestrator<'a, H>
where
    H: DownloadHost,
{
    host: &'a H,
    limiter: &'a mut RateLimiter,
    poll_interval: Duration,
    segment_timeout: Duration,
}

impl<'a, H> DownloadOrchestrator<'a, H>
where
    H: DownloadHost,
{
    pub fn new(host: &'a H, limiter: &'a mut RateLimiter) -> Self {
        Self {
            host,
            limiter,
            poll_interval: DEFAULT_POLL_INTERVAL,
            segment_timeout: DEFAULT_SEGMENT_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_segment_timeout(mut self, timeout: Duration) -> Self {
        self.segment_timeout = timeout;
        self
    }

    /// Download every chapter into a folder derived from
    /// `destination_key`, pacing between chapters and reporting
    /// progress in strictly increasing order.
    pub async fn download_all(
        &mut self,
        chapters: &[Chapter],
        destination_key: &str,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> DownloadOutcome<H::Handle> {
        let folder = sanitize_title(destination_key);
        let total = chapters.len();

        let mut outcome = DownloadOutcome {
            completed: 0,
            failed: 0,
            total,
            handles: Vec::with_capacity(total),
            errors: Vec::new(),
        };

        tracing::info!(folder = %folder, total, "Starting chapter downloads");

        for (position, chapter) in chapters.iter().enumerate() {
            let destination = format!("{folder}/{:03}.mp3", position + 1);

            match self.download_one(chapter, &destination).await {
                Ok(handle) => {
                    outcome.handles.push(handle);
                    outcome.completed += 1;
                    tracing::info!(
                        index = chapter.index,
                        completed = outcome.completed,
                        total,
                        "Chapter downloaded"
                    );
                    if let Some(progress) = on_progress.as_mut() {
                        progress(outcome.completed, total);
                    }
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(index = chapter.index, "Chapter failed: {e}");
                    outcome.errors.push(ChapterFailure {
                        chapter_index: chapter.index,
                        error: e.to_string(),
                    });
                }
            }

            if position + 1 < total {
                self.limiter.wait_for_next_segment().await;
            }
        }

        tracing::info!(
            completed = outcome.completed,
            failed = outcome.failed,
            total,
            "Job finished"
        );

        outcome
    }

    async fn download_one(&self, chapter: &Chapter, destination: &str) -> HibikiResult<H::Handle> {
        let handle = self.host.submit(&chapter.url, destination).await?;

        let deadline = tokio::time::Instant::now() + self.segment_timeout;
        loop {
            match self.host.query_state(&handle).await? {
                HandleState::Complete { .. } => return Ok(handle),
                HandleState::Interrupted { error } => return Err(HibikiError::HostRejected(error)),
                HandleState::Pending => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(HibikiError::SegmentStalled {
                    index: chapter.index,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
