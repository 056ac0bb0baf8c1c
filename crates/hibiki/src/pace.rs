//! Pacing policy between segment downloads.
//!
//! Every download of a work funnels through one [`RateLimiter`]. The
//! limiter keeps request cadence inside a profile that does not look
//! like bulk scraping to the host: a jittered delay between segments,
//! an optional longer break every few segments, and a rolling-hour cap
//! on how many works may start. All state is in-memory; a process
//! restart resets it.

use std::{ops::RangeInclusive, time::Duration};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

const WORK_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthMode {
    Safe,
    Balanced,
    Aggressive,
}

struct ModeConfig {
    segment_delay_ms: RangeInclusive<u64>,
    /// `None` disables periodic breaks.
    break_every: Option<u32>,
    break_delay_ms: RangeInclusive<u64>,
    max_works_per_hour: usize,
}

impl StealthMode {
    fn config(&self) -> ModeConfig {
        match self {
            StealthMode::Safe => ModeConfig {
                segment_delay_ms: 1000..=2000,
                break_every: Some(3),
                break_delay_ms: 5000..=10000,
                max_works_per_hour: 1,
            },
            StealthMode::Balanced => ModeConfig {
                segment_delay_ms: 1000..=2000,
                break_every: Some(5),
                break_delay_ms: 5000..=10000,
                max_works_per_hour: 2,
            },
            StealthMode::Aggressive => ModeConfig {
                segment_delay_ms: 1000..=2000,
                break_every: None,
                break_delay_ms: 5000..=10000,
                max_works_per_hour: 5,
            },
        }
    }

    pub fn max_works_per_hour(&self) -> usize {
        self.config().max_works_per_hour
    }
}

pub struct RateLimiter {
    mode: StealthMode,
    /// Segments waited for in the current job.
    segments_this_job: u32,
    /// Work-start history. Appended on `record_work_start`, pruned
    /// lazily when the quota is consulted.
    work_starts: Vec<Instant>,
}

impl RateLimiter {
    pub fn new(mode: StealthMode) -> Self {
        Self {
            mode,
            segments_this_job: 0,
            work_starts: Vec::new(),
        }
    }

    pub fn mode(&self) -> StealthMode {
        self.mode
    }

    /// Suspend for the mode's jittered per-segment delay, plus a break
    /// delay whenever the per-job segment counter reaches a multiple of
    /// the break cadence. The counter is incremented exactly once per
    /// call whether or not a break fires.
    pub async fn wait_for_next_segment(&mut self) {
        let config = self.mode.config();

        let delay = jitter(config.segment_delay_ms);
        tokio::time::sleep(delay).await;

        self.segments_this_job += 1;

        if let Some(every) = config.break_every {
            if self.segments_this_job % every == 0 {
                let pause = jitter(config.break_delay_ms);
                tracing::debug!(
                    segments = self.segments_this_job,
                    pause_ms = pause.as_millis() as u64,
                    "Taking a periodic break"
                );
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// Whether a new work may start under the rolling-hour quota.
    pub fn can_start_work(&mut self) -> bool {
        self.prune();
        self.work_starts.len() < self.mode.config().max_works_per_hour
    }

    /// Zero if a work may start now, otherwise the time until the
    /// oldest recorded start ages out of the window.
    pub fn time_until_next_work(&mut self) -> Duration {
        if self.can_start_work() {
            return Duration::ZERO;
        }

        let now = Instant::now();
        self.work_starts
            .iter()
            .map(|start| WORK_WINDOW.saturating_sub(now.duration_since(*start)))
            .min()
            .unwrap_or(Duration::ZERO)
    }

    pub fn record_work_start(&mut self) {
        self.work_starts.push(Instant::now());
    }

    /// Forget the break cadence of the previous job.
    pub fn reset_segment_counter(&mut self) {
        self.segments_this_job = 0;
    }

    fn prune(&mut self) {
        let now = Instant::now();
        self.work_starts
            .retain(|start| now.duration_since(*start) < WORK_WINDOW);
    }
}

fn jitter(range_ms: RangeInclusive<u64>) -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(range_ms))
}
