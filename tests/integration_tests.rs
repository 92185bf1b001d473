//! Integration tests for the elscan library.
//!
//! These tests drive the engine through real providers: book files laid out
//! in a temporary texts directory, in-memory texts, and generated inputs.

use std::fs;
use std::path::{Path, PathBuf};

use elscan::config::Config;
use elscan::els::{CompletionReason, Direction, ElsResultSet, TextProvenance};
use elscan::engine::{ElsEngine, SearchOptions, find_intersections};
use elscan::hebrew;
use elscan::provider::local::LocalTextProvider;
use elscan::provider::{BOOKS, Edition, MemoryTextProvider};
use proptest::prelude::*;
use tempfile::TempDir;

/// Test helper holding a temporary texts directory.
struct TestTexts {
    _temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestTexts {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Every book in the Leningrad layout, two short verses each.
    fn leningrad() -> Self {
        let texts = Self::new();
        for book in &BOOKS {
            write_leningrad(
                &texts.root,
                book.leningrad_file,
                &[&["בְּרֵאשִׁית בָּרָא", "אֱלֹהִים"]],
            );
        }
        texts
    }

    fn provider(&self, edition: Edition) -> LocalTextProvider {
        LocalTextProvider::new(self.root.clone(), edition)
    }
}

fn write_leningrad(dir: &Path, file: &str, chapters: &[&[&str]]) {
    let json = serde_json::json!({ "text": chapters });
    fs::write(dir.join(file), json.to_string()).expect("Failed to write book");
}

fn options(max_skip: usize) -> SearchOptions {
    SearchOptions {
        max_skip_distance: max_skip,
        ..SearchOptions::default()
    }
}

// =============================================================================
// Engine over local files
// =============================================================================

#[test]
fn searches_a_book_from_disk() {
    let texts = TestTexts::leningrad();
    let mut engine = ElsEngine::new(texts.provider(Edition::Leningrad));

    let set = engine.search_els("בר", "genesis", &options(7)).unwrap();

    assert_eq!(set.text_provenance(), TextProvenance::Loaded);
    assert_eq!(set.completion_reason(), CompletionReason::Completed);
    let found: Vec<(usize, usize)> = set
        .results()
        .iter()
        .map(|r| (r.start_position(), r.skip_distance()))
        .collect();
    assert_eq!(found, vec![(0, 1), (6, 1), (0, 7)]);
}

#[test]
fn torah_source_spans_all_books() {
    let texts = TestTexts::leningrad();
    let mut engine = ElsEngine::new(texts.provider(Edition::Leningrad));

    let book = engine.search_els("בר", "genesis", &options(1)).unwrap();
    let torah = engine.search_els("בר", "torah", &options(1)).unwrap();

    assert_eq!(torah.len(), book.len() * BOOKS.len());
    assert!(torah.results().iter().any(|r| r.start_position() >= 14 * 4));
}

#[test]
fn koren_edition_reads_plain_text() {
    let texts = TestTexts::new();
    fs::write(texts.root.join("text_koren_4numbers.txt"), "וַיְדַבֵּר יְהוָה").unwrap();
    let mut engine = ElsEngine::new(texts.provider(Edition::Koren));

    let set = engine.search_els("דבר", "numbers", &options(1)).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.results()[0].positions(), vec![2, 3, 4]);
}

#[test]
fn missing_book_falls_back_to_sample() {
    let texts = TestTexts::new();
    let mut engine = ElsEngine::new(texts.provider(Edition::Leningrad));

    let fallback = engine.search_els("אלהים", "exodus", &options(1)).unwrap();
    assert_eq!(fallback.text_provenance(), TextProvenance::Fallback);
    assert!(!fallback.is_empty());
    assert_eq!(engine.cache_stats().result_cache_size, 0);

    // Once the book appears the next search reads it.
    write_leningrad(&texts.root, "text_leningrad_2exodus.json", &[&["וְאֵלֶּה שְׁמוֹת"]]);
    let loaded = engine.search_els("אלהים", "exodus", &options(1)).unwrap();
    assert_eq!(loaded.text_provenance(), TextProvenance::Loaded);
    assert!(loaded.is_empty());
}

#[test]
fn config_builds_a_working_provider() {
    let texts = TestTexts::leningrad();
    let config = Config::parse(&format!(
        "[texts]\ndir = \"{}\"\n\n[search]\nmax_skip_distance = 3\n",
        texts.root.display()
    ))
    .unwrap();

    let mut engine = ElsEngine::with_cache_size(config.text_provider(), config.cache.max_entries);
    let set = engine.search_els("בר", "genesis", &config.search).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn handle_reports_live_status_from_callback() {
    let texts = TestTexts::leningrad();
    let mut engine = ElsEngine::new(texts.provider(Edition::Leningrad));
    let handle = engine.cancel_handle();
    let opts = SearchOptions {
        chunk_size: 2,
        ..options(7)
    };

    let mut percents = Vec::new();
    engine
        .search_els_with_progress("בר", "genesis", &opts, &mut |_| {
            let status = handle.status();
            assert!(status.is_searching);
            assert_eq!(status.search_term.as_deref(), Some("בר"));
            if let Some(progress) = status.progress {
                percents.push(progress.progress_percent);
            }
        })
        .unwrap();

    assert!(percents.len() > 1);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(!handle.is_searching());
    assert!(!engine.search_status().is_searching);
}

// =============================================================================
// Export and crossings
// =============================================================================

#[test]
fn engine_output_survives_json_export() {
    let mut engine = ElsEngine::new(elscan::provider::SampleTextProvider);
    let opts = SearchOptions {
        search_backward: true,
        ..options(40)
    };
    let set = engine.search_els("אור", "sample", &opts).unwrap();
    assert!(!set.is_empty());

    let restored = ElsResultSet::from_json(&set.to_json().unwrap()).unwrap();
    assert_eq!(restored, set);
    assert_eq!(restored.statistics(), set.statistics());
}

#[test]
fn crossing_terms_share_positions() {
    let mut engine = ElsEngine::new(elscan::provider::SampleTextProvider);
    let batch = engine.search_multiple_terms(&["אור", "יהי"], "sample", &options(1));
    let (first, second) = (&batch[0].1, &batch[1].1);

    // "ויהי אור" puts the two words next to each other, never overlapping.
    assert!(find_intersections(first, second).is_empty());

    let wider = engine.search_multiple_terms(&["אור", "ראו"], "sample", &options(20));
    let crossings = find_intersections(&wider[0].1, &wider[1].1);
    for crossing in &crossings {
        let shared: Vec<usize> = crossing
            .first
            .positions()
            .into_iter()
            .filter(|p| crossing.second.positions().contains(p))
            .collect();
        assert_eq!(shared, crossing.points);
    }
}

// =============================================================================
// Properties
// =============================================================================

fn reversed(text: &str) -> String {
    text.chars().rev().collect()
}

proptest! {
    #[test]
    fn normalization_is_idempotent(input in "\\PC{0,80}") {
        let once = hebrew::normalize(&input);
        prop_assert_eq!(hebrew::normalize(&once), once.clone());
        prop_assert!(once.chars().all(hebrew::is_hebrew_letter));
    }

    #[test]
    fn hebrew_with_marks_normalizes_to_letters(input in "[א-ת\u{05B0}-\u{05BC} ,.]{0,60}") {
        let once = hebrew::normalize(&input);
        prop_assert_eq!(hebrew::normalize(&once), once);
    }

    #[test]
    fn every_result_spells_the_term(text in "[אבג]{10,80}", term in "[אבג]{2,3}") {
        let mut engine = ElsEngine::new(MemoryTextProvider::new().with_text("t", &text));
        let opts = SearchOptions {
            max_skip_distance: 12,
            search_backward: true,
            chunk_size: 7,
            ..SearchOptions::default()
        };
        let set = engine.search_els(&term, "t", &opts).unwrap();
        let letters: Vec<char> = text.chars().collect();

        for result in set.results() {
            prop_assert!(result.is_valid());
            for (i, m) in result.matches().iter().enumerate() {
                let expected = match result.direction() {
                    Direction::Forward => result.start_position() + i * result.skip_distance(),
                    Direction::Backward => result.start_position() - i * result.skip_distance(),
                };
                prop_assert_eq!(m.position, expected);
                prop_assert_eq!(letters[m.position], m.letter);
                prop_assert_eq!(term.chars().nth(i), Some(m.letter));
            }
        }
    }

    #[test]
    fn backward_equals_forward_over_reversed_text(text in "[אבג]{10,60}", term in "[אבג]{2,3}") {
        let provider = MemoryTextProvider::new()
            .with_text("t", &text)
            .with_text("r", &reversed(&text));
        let mut engine = ElsEngine::new(provider);
        let last = text.chars().count() - 1;

        let backward = engine
            .search_els(&term, "t", &SearchOptions {
                max_skip_distance: 10,
                search_forward: false,
                search_backward: true,
                ..SearchOptions::default()
            })
            .unwrap();
        let forward = engine.search_els(&term, "r", &options(10)).unwrap();

        let mut from_backward: Vec<(usize, usize)> = backward
            .results()
            .iter()
            .map(|r| (last - r.start_position(), r.skip_distance()))
            .collect();
        let mut from_forward: Vec<(usize, usize)> = forward
            .results()
            .iter()
            .map(|r| (r.start_position(), r.skip_distance()))
            .collect();
        from_backward.sort_unstable();
        from_forward.sort_unstable();
        prop_assert_eq!(from_backward, from_forward);
    }

    #[test]
    fn repeated_searches_agree(text in "[אבג]{10,60}", term in "[אבג]{2,3}") {
        let mut engine = ElsEngine::new(MemoryTextProvider::new().with_text("t", &text));
        let first = engine.search_els(&term, "t", &options(8)).unwrap();
        let second = engine.search_els(&term, "t", &options(8)).unwrap();
        prop_assert_eq!(first.results(), second.results());
    }
}
