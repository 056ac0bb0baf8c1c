use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book-level metadata, immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Never empty. A manifest without an author-role contributor
    /// yields a single "Unknown" entry.
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    /// Total duration in minutes, rounded from the summed segment durations.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One independently downloadable audio segment of a work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Zero-based spine-declared index. Unique and contiguous, defines
    /// the presentation order. May diverge from the structural position
    /// the chapter was built from.
    pub index: u32,
    pub title: String,
    /// Fully qualified, carries the per-segment access token.
    pub url: String,
    /// Seconds.
    pub duration: f64,
    /// Cumulative seconds preceding this segment, accumulated in
    /// structural order.
    pub start_time: f64,
}

/// Extraction output: metadata plus the ordered chapter list, stamped
/// for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookData {
    pub metadata: BookMetadata,
    pub chapters: Vec<Chapter>,
    pub extracted_at: DateTime<Utc>,
    /// Host origin the chapters were extracted from.
    pub source: String,
}

/// Per-segment access tokens, indexed by the segment's position in the
/// manifest's spine list (not by its declared index).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessParameters {
    tokens: Vec<String>,
}

impl AccessParameters {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.tokens.get(position).map(String::as_str)
    }
}

impl From<Vec<String>> for AccessParameters {
    fn from(tokens: Vec<String>) -> Self {
        Self::new(tokens)
    }
}

/// Caller-supplied chapter titles, keyed by chapter index. Wins over
/// both the default title and a table-of-contents match.
pub type TitleOverrides = BTreeMap<u32, String>;
