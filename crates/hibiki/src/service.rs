//! Top-level composition of the download pipeline.
//!
//! [`DownloadService`] owns the host capability, the rate limiter and
//! the tracker with an explicit lifecycle. All of them are single-owner
//! and touched only from the caller's task, so none of this needs
//! locking; a genuinely multi-threaded embedding must wrap the service
//! in a mutex or an actor.

use std::time::Duration;

use crate::{
    download::{ChapterFailure, DownloadOrchestrator, ProgressFn},
    error::{HibikiError, HibikiResult},
    host::DownloadHost,
    model::BookData,
    pace::{RateLimiter, StealthMode},
    persist::MetadataPersister,
    tracker::{DownloadRecord, DownloadTracker, WorkId},
};

/// What one finished job looked like.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub work_id: WorkId,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub errors: Vec<ChapterFailure>,
    /// Set when the metadata sidecar could not be written. Chapter
    /// results above are unaffected.
    pub sidecar_error: Option<String>,
}

pub struct DownloadService<H>
where
    H: DownloadHost,
{
    host: H,
    limiter: RateLimiter,
    tracker: DownloadTracker,
    persister: MetadataPersister,
    segment_timeout: Duration,
}

impl<H> DownloadService<H>
where
    H: DownloadHost,
{
    pub fn new(host: H, mode: StealthMode) -> Self {
        Self {
            host,
            limiter: RateLimiter::new(mode),
            tracker: DownloadTracker::new(),
            persister: MetadataPersister::new(),
            segment_timeout: crate::download::DEFAULT_SEGMENT_TIMEOUT,
        }
    }

    pub fn with_segment_timeout(mut self, timeout: Duration) -> Self {
        self.segment_timeout = timeout;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn time_until_next_work(&mut self) -> Duration {
        self.limiter.time_until_next_work()
    }

    /// Run one work end to end: quota check, chapter downloads into a
    /// folder named after the sanitized title, metadata sidecar,
    /// tracker bookkeeping.
    pub async fn start(
        &mut self,
        book: BookData,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> HibikiResult<JobSummary> {
        if !self.limiter.can_start_work() {
            return Err(HibikiError::HourlyQuotaExceeded {
                retry_after: self.limiter.time_until_next_work(),
            });
        }
        self.limiter.record_work_start();
        self.limiter.reset_segment_counter();

        let work_id = self.tracker.create_download(&book);
        let destination_key = book.metadata.title.clone();

        let outcome = {
            let tracker = &mut self.tracker;
            let id = work_id.clone();
            let mut progress = |completed: usize, total: usize| {
                tracker.update_progress(&id, completed, 0);
                if let Some(cb) = on_progress.as_mut() {
                    cb(completed, total);
                }
            };

            DownloadOrchestrator::new(&self.host, &mut self.limiter)
                .with_segment_timeout(self.segment_timeout)
                .download_all(&book.chapters, &destination_key, Some(&mut progress))
                .await
        };

        let sidecar_error = match self
            .persister
            .save(
                &self.host,
                &book.metadata,
                &book.chapters,
                &destination_key,
            )
            .await
        {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(work_id = %work_id, "Failed to persist metadata sidecar: {e}");
                Some(e.to_string())
            }
        };

        self.tracker.complete_download(&work_id, &outcome);

        Ok(JobSummary {
            work_id,
            completed: outcome.completed,
            failed: outcome.failed,
            total: outcome.total,
            errors: outcome.errors,
            sidecar_error,
        })
    }

    pub fn status(&self, work_id: &str) -> Option<&DownloadRecord> {
        self.tracker.get_status(work_id)
    }

    /// Evict a finished record. Records are never removed on their own.
    pub fn evict(&mut self, work_id: &str) -> Option<DownloadRecord> {
        self.tracker.remove_download(work_id)
    }
}
