//! Structure-tree types and access-parameter observation.
//!
//! The host application describes a work with an in-memory tree:
//! contributors, an ordered spine of audio segments, and an optional
//! table of contents. Per-segment access tokens are not part of the
//! tree; they surface as a side effect of the host's own data loading
//! and have to be captured when they pass by. [`ParameterCell`] is the
//! explicit, owned collaborator that does the capturing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{HibikiError, HibikiResult},
    model::AccessParameters,
};

const MANIFEST_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MANIFEST_POLL_ATTEMPTS: u32 = 20;

/// The key the host uses for the per-segment compatibility token array.
const PARAMETER_KEY: &str = "cmptParams";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributorRole {
    Author,
    Narrator,
    Other,
}

impl Serialize for ContributorRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            ContributorRole::Author => "author",
            ContributorRole::Narrator => "narrator",
            ContributorRole::Other => "other",
        })
    }
}

impl<'de> Deserialize<'de> for ContributorRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Roles the extractor does not partition on are all "other".
        let role = String::deserialize(deserializer)?;
        Ok(match role.as_str() {
            "author" => ContributorRole::Author,
            "narrator" => ContributorRole::Narrator,
            _ => ContributorRole::Other,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub role: ContributorRole,
}

/// One structural segment entry of the spine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpineEntry {
    /// Storage path of the segment, relative to the host origin.
    pub path: String,
    /// Declared spine position. Usually equals the entry's list
    /// position, but the two may diverge and are tracked independently.
    pub position: u32,
    /// Declared duration in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    /// Storage path the entry points at. Resolved against the spine.
    pub path: String,
}

/// The host application's in-memory description of a work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookManifest {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creators: Vec<Contributor>,
    pub spine: Vec<SpineEntry>,
    #[serde(default)]
    pub toc: Vec<TocEntry>,
    #[serde(default)]
    pub cover_path: Option<String>,
    /// Origin the segment paths are resolved against.
    pub origin: Url,
}

/// Captures the access-parameter array as it passes through the host's
/// data loading.
///
/// The original environment had to monkey-patch a global
/// deserialization hook for this; here the component doing the load
/// owns a cell and feeds every deserialized payload through
/// [`observe`](Self::observe). Observation is transparent: the payload
/// is only inspected, never modified, and a payload without the
/// parameter carrier is silently ignored. Absence is reported later, at
/// extraction time.
#[derive(Debug, Default)]
pub struct ParameterCell {
    captured: Option<AccessParameters>,
}

impl ParameterCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect one deserialized payload. If it carries a nested
    /// `cmptParams` string array, copy it into the cell. A later
    /// sighting overwrites an earlier one.
    pub fn observe(&mut self, payload: &serde_json::Value) {
        if let Some(tokens) = find_parameter_array(payload) {
            tracing::debug!(tokens = tokens.len(), "Captured access parameter array");
            self.captured = Some(AccessParameters::new(tokens));
        }
    }

    pub fn get(&self) -> Option<&AccessParameters> {
        self.captured.as_ref()
    }

    pub fn take(&mut self) -> Option<AccessParameters> {
        self.captured.take()
    }

    pub fn is_empty(&self) -> bool {
        self.captured.is_none()
    }
}

fn find_parameter_array(value: &serde_json::Value) -> Option<Vec<String>> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(items)) = map.get(PARAMETER_KEY) {
                let tokens: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                if let Some(tokens) = tokens {
                    return Some(tokens);
                }
            }
            map.values().find_map(find_parameter_array)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_parameter_array),
        _ => None,
    }
}

/// Wait for the host application to finish loading the structure tree.
///
/// Probes every 500ms and gives up after 10 seconds with
/// [`HibikiError::ManifestUnavailable`].
pub async fn wait_for_manifest<F>(mut probe: F) -> HibikiResult<BookManifest>
where
    F: FnMut() -> Option<BookManifest>,
{
    for attempt in 0..MANIFEST_POLL_ATTEMPTS {
        if let Some(manifest) = probe() {
            return Ok(manifest);
        }
        tracing::debug!(attempt, "Manifest not ready yet");
        tokio::time::sleep(MANIFEST_POLL_INTERVAL).await;
    }

    Err(HibikiError::ManifestUnavailable)
}
