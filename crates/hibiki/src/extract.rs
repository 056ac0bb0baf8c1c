//! Reconstruction of the ordered, URL-addressable chapter list.
//!
//! The segment locations of a work are listed nowhere; they are rebuilt
//! from the manifest's spine and the captured per-segment access
//! tokens. The spine is walked in structural order while each chapter
//! keeps its spine-declared index, so the two orderings stay
//! independent.

use chrono::Utc;

use crate::{
    error::{HibikiError, HibikiResult},
    manifest::{BookManifest, ContributorRole},
    model::{AccessParameters, BookData, BookMetadata, Chapter, TitleOverrides},
};

/// Build [`BookData`] from a loaded manifest and the captured access
/// parameters.
///
/// Fails fast on the two fatal conditions: an unloaded manifest (empty
/// spine) and missing or insufficient access parameters. Everything
/// else, including an inconsistent table of contents, is handled
/// best-effort.
pub fn extract(
    manifest: &BookManifest,
    parameters: &AccessParameters,
    overrides: Option<&TitleOverrides>,
) -> HibikiResult<BookData> {
    if manifest.spine.is_empty() {
        return Err(HibikiError::ManifestUnavailable);
    }
    if parameters.is_empty() {
        return Err(HibikiError::AccessParametersMissing);
    }
    if parameters.len() < manifest.spine.len() {
        return Err(HibikiError::AccessParametersExhausted {
            expected: manifest.spine.len(),
            actual: parameters.len(),
        });
    }

    let mut authors = Vec::new();
    let mut narrators = Vec::new();
    for contributor in &manifest.creators {
        match contributor.role {
            ContributorRole::Author => authors.push(contributor.name.clone()),
            ContributorRole::Narrator => narrators.push(contributor.name.clone()),
            ContributorRole::Other => {}
        }
    }
    if authors.is_empty() {
        authors.push("Unknown".to_string());
    }

    // Clamp declared durations once so the metadata total stays the
    // sum of the chapter durations built below.
    let total_seconds: f64 = manifest
        .spine
        .iter()
        .map(|entry| entry.duration.max(0.0))
        .sum();

    let cover_url = manifest
        .cover_path
        .as_deref()
        .and_then(|path| manifest.origin.join(path).ok())
        .map(|url| url.to_string());

    let mut chapters = Vec::with_capacity(manifest.spine.len());
    let mut start_time = 0.0;
    for (position, entry) in manifest.spine.iter().enumerate() {
        // parameters.len() >= spine.len() was checked above
        let token = parameters
            .get(position)
            .ok_or(HibikiError::AccessParametersMissing)?;

        let mut url = manifest.origin.join(&entry.path)?;
        url.query_pairs_mut().append_pair("cmpt", token);

        let duration = entry.duration.max(0.0);
        chapters.push(Chapter {
            index: entry.position,
            title: format!("Part {}", entry.position + 1),
            url: url.to_string(),
            duration,
            start_time,
        });
        start_time += duration;
    }

    // TOC entries name a path, not an index; resolve each one against
    // the spine's declared position for that path. Entries pointing at
    // unknown paths or out-of-range indices are dropped silently.
    for toc in &manifest.toc {
        let Some(resolved) = manifest
            .spine
            .iter()
            .find(|entry| entry.path == toc.path)
            .map(|entry| entry.position)
        else {
            tracing::debug!(path = %toc.path, "TOC entry points at no spine path, skipping");
            continue;
        };

        if let Some(chapter) = chapters.iter_mut().find(|c| c.index == resolved) {
            chapter.title = toc.title.clone();
        }
    }

    if let Some(overrides) = overrides {
        for (index, title) in overrides {
            if let Some(chapter) = chapters.iter_mut().find(|c| c.index == *index) {
                chapter.title = title.clone();
            }
        }
    }

    let metadata = BookMetadata {
        title: manifest.title.clone(),
        subtitle: manifest.subtitle.clone(),
        authors,
        narrators,
        duration: (total_seconds / 60.0).round() as u64,
        cover_url,
        description: manifest.description.clone(),
    };

    tracing::info!(
        title = %metadata.title,
        chapters = chapters.len(),
        minutes = metadata.duration,
        "Extracted book"
    );

    Ok(BookData {
        metadata,
        chapters,
        extracted_at: Utc::now(),
        source: manifest.origin.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Contributor, SpineEntry, TocEntry};
    use url::Url;

    fn manifest(spine: Vec<SpineEntry>) -> BookManifest {
        BookManifest {
            title: "The Test Book".to_string(),
            subtitle: None,
            description: None,
            creators: vec![
                Contributor {
                    name: "A. Writer".to_string(),
                    role: ContributorRole::Author,
                },
                Contributor {
                    name: "N. Reader".to_string(),
                    role: ContributorRole::Narrator,
                },
            ],
            spine,
            toc: vec![],
            cover_path: None,
            origin: Url::parse("https://listen.example.com").unwrap(),
        }
    }

    fn entry(path: &str, position: u32, duration: f64) -> SpineEntry {
        SpineEntry {
            path: path.to_string(),
            position,
            duration,
        }
    }

    #[test]
    fn test_extract_fails_without_spine() {
        let result = extract(
            &manifest(vec![]),
            &AccessParameters::new(vec!["t".into()]),
            None,
        );
        assert!(matches!(result, Err(HibikiError::ManifestUnavailable)));
    }

    #[test]
    fn test_extract_fails_without_parameters() {
        let result = extract(
            &manifest(vec![entry("part-001.mp3", 0, 10.0)]),
            &AccessParameters::default(),
            None,
        );
        assert!(matches!(result, Err(HibikiError::AccessParametersMissing)));
    }

    #[test]
    fn test_extract_fails_on_short_parameter_array() {
        let result = extract(
            &manifest(vec![
                entry("part-001.mp3", 0, 10.0),
                entry("part-002.mp3", 1, 10.0),
            ]),
            &AccessParameters::new(vec!["only-one".into()]),
            None,
        );
        assert!(matches!(
            result,
            Err(HibikiError::AccessParametersExhausted {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_start_times_are_prefix_sums() {
        let book = extract(
            &manifest(vec![
                entry("part-001.mp3", 0, 30.0),
                entry("part-002.mp3", 1, 45.5),
                entry("part-003.mp3", 2, 12.5),
            ]),
            &AccessParameters::new(vec!["a".into(), "b".into(), "c".into()]),
            None,
        )
        .unwrap();

        assert_eq!(book.chapters.len(), 3);
        assert_eq!(book.chapters[0].start_time, 0.0);
        assert_eq!(book.chapters[1].start_time, 30.0);
        assert_eq!(book.chapters[2].start_time, 75.5);
    }

    #[test]
    fn test_url_carries_positional_token() {
        let book = extract(
            &manifest(vec![
                entry("part-001.mp3", 0, 1.0),
                entry("part-002.mp3", 1, 1.0),
            ]),
            &AccessParameters::new(vec!["first token".into(), "second".into()]),
            None,
        )
        .unwrap();

        assert_eq!(
            book.chapters[0].url,
            "https://listen.example.com/part-001.mp3?cmpt=first+token"
        );
        assert_eq!(
            book.chapters[1].url,
            "https://listen.example.com/part-002.mp3?cmpt=second"
        );
    }

    #[test]
    fn test_index_follows_spine_declaration_not_walk_order() {
        // declared positions diverge from structural order
        let book = extract(
            &manifest(vec![
                entry("part-002.mp3", 1, 10.0),
                entry("part-001.mp3", 0, 20.0),
            ]),
            &AccessParameters::new(vec!["a".into(), "b".into()]),
            None,
        )
        .unwrap();

        assert_eq!(book.chapters[0].index, 1);
        assert_eq!(book.chapters[1].index, 0);
        // start times still accumulate structurally
        assert_eq!(book.chapters[0].start_time, 0.0);
        assert_eq!(book.chapters[1].start_time, 10.0);
    }

    #[test]
    fn test_toc_overrides_title_and_duration_rounds_to_minutes() {
        let mut m = manifest(vec![
            entry("part-001.mp3", 0, 100.0),
            entry("part-002.mp3", 1, 200.0),
        ]);
        m.toc = vec![TocEntry {
            title: "Intro".to_string(),
            path: "part-002.mp3".to_string(),
        }];

        let book = extract(
            &m,
            &AccessParameters::new(vec!["a".into(), "b".into()]),
            None,
        )
        .unwrap();

        assert_eq!(book.chapters[0].title, "Part 1");
        assert_eq!(book.chapters[1].title, "Intro");
        assert_eq!(book.chapters[1].start_time, 100.0);
        assert_eq!(book.metadata.duration, 5);
    }

    #[test]
    fn test_negative_durations_are_clamped_everywhere() {
        let book = extract(
            &manifest(vec![
                entry("part-001.mp3", 0, -30.0),
                entry("part-002.mp3", 1, 90.0),
            ]),
            &AccessParameters::new(vec!["a".into(), "b".into()]),
            None,
        )
        .unwrap();

        assert_eq!(book.chapters[0].duration, 0.0);
        assert_eq!(book.chapters[1].start_time, 0.0);

        // metadata total derives from the clamped chapter durations
        let chapter_seconds: f64 = book.chapters.iter().map(|c| c.duration).sum();
        assert_eq!(
            book.metadata.duration,
            (chapter_seconds / 60.0).round() as u64
        );
        assert_eq!(book.metadata.duration, 2);
    }

    #[test]
    fn test_inconsistent_toc_is_dropped_silently() {
        let mut m = manifest(vec![entry("part-001.mp3", 0, 60.0)]);
        m.toc = vec![TocEntry {
            title: "Ghost".to_string(),
            path: "no-such-part.mp3".to_string(),
        }];

        let book = extract(&m, &AccessParameters::new(vec!["a".into()]), None).unwrap();
        assert_eq!(book.chapters[0].title, "Part 1");
    }

    #[test]
    fn test_overrides_win_over_toc() {
        let mut m = manifest(vec![entry("part-001.mp3", 0, 60.0)]);
        m.toc = vec![TocEntry {
            title: "From TOC".to_string(),
            path: "part-001.mp3".to_string(),
        }];
        let overrides = TitleOverrides::from([(0, "From Caller".to_string())]);

        let book = extract(
            &m,
            &AccessParameters::new(vec!["a".into()]),
            Some(&overrides),
        )
        .unwrap();
        assert_eq!(book.chapters[0].title, "From Caller");
    }

    #[test]
    fn test_contributors_partitioned_by_role() {
        let book = extract(
            &manifest(vec![entry("part-001.mp3", 0, 60.0)]),
            &AccessParameters::new(vec!["a".into()]),
            None,
        )
        .unwrap();

        assert_eq!(book.metadata.authors, vec!["A. Writer"]);
        assert_eq!(book.metadata.narrators, vec!["N. Reader"]);
    }
}
