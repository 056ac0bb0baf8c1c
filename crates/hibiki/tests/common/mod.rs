//! Scripted in-memory host used by the orchestrator and service tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use chrono::Utc;
use hibiki::{
    BookData, BookMetadata, Chapter, DownloadHost, HandleState, HibikiError, HibikiResult,
};

struct Entry {
    pending_polls_left: u64,
    terminal: HandleState,
}

/// A download host whose behavior is scripted per submission position:
/// a submission can succeed after a couple of pending polls (the
/// default), end interrupted, or never settle at all.
pub struct MockHost {
    submissions: Mutex<Vec<(String, String)>>,
    fail_positions: HashSet<usize>,
    stall_positions: HashSet<usize>,
    pending_polls: u64,
    states: Mutex<HashMap<u64, Entry>>,
    next_handle: AtomicU64,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            fail_positions: HashSet::new(),
            stall_positions: HashSet::new(),
            pending_polls: 2,
            states: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Submissions at these zero-based positions end interrupted.
    pub fn failing(positions: &[usize]) -> Self {
        Self {
            fail_positions: positions.iter().copied().collect(),
            ..Self::new()
        }
    }

    /// Submissions at these zero-based positions never settle.
    pub fn stalling(positions: &[usize]) -> Self {
        Self {
            stall_positions: positions.iter().copied().collect(),
            ..Self::new()
        }
    }

    pub fn submitted(&self) -> Vec<(String, String)> {
        self.submissions.lock().unwrap().clone()
    }

    fn register(&self, url: String, destination: String) -> u64 {
        let mut submissions = self.submissions.lock().unwrap();
        let position = submissions.len();
        submissions.push((url, destination.clone()));

        let terminal = if self.fail_positions.contains(&position) {
            HandleState::Interrupted {
                error: "induced failure".to_string(),
            }
        } else {
            HandleState::Complete {
                resolved_path: Some(destination),
            }
        };
        let pending_polls_left = if self.stall_positions.contains(&position) {
            u64::MAX
        } else {
            self.pending_polls
        };

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.states.lock().unwrap().insert(
            handle,
            Entry {
                pending_polls_left,
                terminal,
            },
        );
        handle
    }
}

impl DownloadHost for MockHost {
    type Handle = u64;

    async fn submit(&self, url: &str, destination: &str) -> HibikiResult<Self::Handle> {
        Ok(self.register(url.to_string(), destination.to_string()))
    }

    async fn submit_data(&self, _data: Vec<u8>, destination: &str) -> HibikiResult<Self::Handle> {
        Ok(self.register("data:".to_string(), destination.to_string()))
    }

    async fn query_state(&self, handle: &Self::Handle) -> HibikiResult<HandleState> {
        let mut states = self.states.lock().unwrap();
        let entry = states.get_mut(handle).ok_or(HibikiError::UnknownHandle)?;
        if entry.pending_polls_left == 0 {
            Ok(entry.terminal.clone())
        } else {
            entry.pending_polls_left -= 1;
            Ok(HandleState::Pending)
        }
    }
}

pub fn chapters(n: usize) -> Vec<Chapter> {
    let mut start_time = 0.0;
    (0..n)
        .map(|i| {
            let duration = 60.0 + i as f64;
            let chapter = Chapter {
                index: i as u32,
                title: format!("Part {}", i + 1),
                url: format!("https://listen.example.com/part-{:03}.mp3?cmpt=tok{i}", i + 1),
                duration,
                start_time,
            };
            start_time += duration;
            chapter
        })
        .collect()
}

pub fn book(n: usize) -> BookData {
    let chapters = chapters(n);
    let seconds: f64 = chapters.iter().map(|c| c.duration).sum();
    BookData {
        metadata: BookMetadata {
            title: "The Test Book".to_string(),
            subtitle: None,
            authors: vec!["A. Writer".to_string()],
            narrators: vec!["N. Reader".to_string()],
            duration: (seconds / 60.0).round() as u64,
            cover_url: None,
            description: None,
        },
        chapters,
        extracted_at: Utc::now(),
        source: "https://listen.example.com/".to_string(),
    }
}
