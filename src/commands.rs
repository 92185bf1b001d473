//! Command implementations shared by CLI and MCP server.

use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use crate::cli::SearchArgs;
use crate::config::Config;
use crate::els::{CompletionReason, ElsResult, ElsResultSet, SortKey, SortOrder, TextProvenance};
use crate::engine::{ElsEngine, Intersection, SearchOptions, SearchProgress, find_intersections};
use crate::gematria::{self, GematriaReport, NumericAnalysis};
use crate::hebrew::{self, TextStatistics};
use crate::provider::local::LocalTextProvider;
use crate::provider::{BOOKS, Edition, SAMPLE_SOURCE, TORAH_SOURCE, TextProvider};

/// Overlay command-line flags on the configured search defaults.
#[must_use]
pub fn search_options(base: &SearchOptions, args: &SearchArgs) -> SearchOptions {
    let (search_forward, search_backward) = args
        .direction
        .map_or((base.search_forward, base.search_backward), |d| d.flags());

    SearchOptions {
        min_skip_distance: args.min_skip.unwrap_or(base.min_skip_distance),
        max_skip_distance: args.max_skip.unwrap_or(base.max_skip_distance),
        search_forward,
        search_backward,
        max_results: args.max_results.unwrap_or(base.max_results),
        timeout_ms: args.timeout_ms.unwrap_or(base.timeout_ms),
        chunk_size: args.chunk_size.unwrap_or(base.chunk_size),
    }
}

fn engine(config: &Config) -> ElsEngine<LocalTextProvider> {
    ElsEngine::with_cache_size(config.text_provider(), config.cache.max_entries)
}

/// Search a configured text source for `term`.
///
/// # Arguments
///
/// * `term` - Hebrew search term
/// * `args` - Source and search flags; unset flags use the config defaults
/// * `sort` / `order` - Optional re-ordering of the final set
/// * `on_progress` - Called after every scanned chunk
///
/// # Errors
///
/// Returns an error if config loading fails or the term or options are
/// rejected. An unreadable source is not an error: the sample text is
/// searched instead and the set is marked as a fallback.
pub fn search(
    term: &str,
    args: &SearchArgs,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
    on_progress: &mut dyn FnMut(&SearchProgress),
) -> anyhow::Result<ElsResultSet> {
    let config = Config::load()?;
    let options = search_options(&config.search, args);

    let mut set =
        engine(&config).search_els_with_progress(term, &args.source, &options, on_progress)?;
    if sort.is_some() || order.is_some() {
        set.sort(sort, order);
    }
    Ok(set)
}

/// Result sets of two terms searched in the same source.
#[derive(Debug, Clone)]
pub struct Crossings {
    pub first: ElsResultSet,
    pub second: ElsResultSet,
}

impl Crossings {
    #[must_use]
    pub fn intersections(&self) -> Vec<Intersection<'_>> {
        find_intersections(&self.first, &self.second)
    }
}

/// Search two terms and pair up the sequences that share letters.
///
/// # Errors
///
/// Returns an error if config loading fails, either term is invalid, or
/// the options are rejected.
pub fn crossings(first: &str, second: &str, args: &SearchArgs) -> anyhow::Result<Crossings> {
    let config = Config::load()?;
    let options = search_options(&config.search, args);

    for term in [first, second] {
        hebrew::validate_search_term(term)
            .map_err(|e| anyhow::anyhow!("Invalid term '{term}': {e}"))?;
    }
    options.validate()?;

    let mut sets = engine(&config)
        .search_multiple_terms(&[first, second], &args.source, &options)
        .into_iter()
        .map(|(_, set)| set);

    let (Some(first_set), Some(second_set)) = (sets.next(), sets.next()) else {
        anyhow::bail!("Search returned no result sets");
    };
    Ok(Crossings {
        first: first_set,
        second: second_set,
    })
}

/// Every gematria method applied to `text`.
///
/// # Errors
///
/// Returns an error if `text` contains no Hebrew letters.
pub fn gematria(text: &str) -> anyhow::Result<GematriaReport> {
    if hebrew::normalize(text).is_empty() {
        anyhow::bail!("No Hebrew letters in '{text}'");
    }
    Ok(gematria::calculate_all(text))
}

/// Letter statistics of one text source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatistics {
    pub source: String,
    #[serde(flatten)]
    pub statistics: TextStatistics,
}

/// Load a source and summarize its letters.
///
/// # Errors
///
/// Returns an error if config loading fails or the source cannot be read.
/// Unlike a search, no sample text is substituted.
pub fn stats(source: &str) -> anyhow::Result<SourceStatistics> {
    let config = Config::load()?;
    let text = config.text_provider().load_text(source)?;

    Ok(SourceStatistics {
        source: source.to_string(),
        statistics: hebrew::text_statistics(&text),
    })
}

/// A searchable source and whether its files are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub available: bool,
}

/// List the sources of the configured texts directory.
///
/// # Errors
///
/// Returns an error if config loading fails.
pub fn sources() -> anyhow::Result<Vec<SourceInfo>> {
    let config = Config::load()?;
    Ok(source_catalog(
        &config.text_provider(),
        &config.texts_dir(),
        config.texts.edition,
    ))
}

fn source_catalog(provider: &dyn TextProvider, dir: &Path, edition: Edition) -> Vec<SourceInfo> {
    let book_present = |file: &str| dir.join(file).is_file();

    provider
        .sources()
        .into_iter()
        .map(|id| {
            let (name, available) = if id == SAMPLE_SOURCE {
                ("Sample (opening of Genesis)".to_string(), true)
            } else if id == TORAH_SOURCE {
                (
                    "Torah (all five books)".to_string(),
                    BOOKS.iter().all(|b| book_present(b.file_name(edition))),
                )
            } else if let Some(book) = BOOKS.iter().find(|b| b.id == id) {
                (
                    format!("{} ({})", book.english_name, book.hebrew_name),
                    book_present(book.file_name(edition)),
                )
            } else {
                (format!("{id}.txt"), true)
            };
            SourceInfo {
                id,
                name,
                available,
            }
        })
        .collect()
}

/// One-line header describing a finished set.
#[must_use]
pub fn format_summary(set: &ElsResultSet) -> String {
    let mut line = format!(
        "{} result(s) for '{}' in {} ({} ms, {})",
        set.len(),
        set.search_term(),
        set.text_source(),
        set.search_time_ms(),
        completion_label(set),
    );
    if set.text_provenance() == TextProvenance::Fallback {
        let _ = write!(
            line,
            "\nwarning: '{}' could not be loaded; searched the sample text instead",
            set.text_source()
        );
    }
    line
}

fn completion_label(set: &ElsResultSet) -> &'static str {
    match set.completion_reason() {
        CompletionReason::Completed => "completed",
        CompletionReason::Cancelled => "cancelled",
        CompletionReason::TimedOut => "timed out, partial results",
        CompletionReason::ResultCapReached => "result cap reached",
    }
}

#[must_use]
pub fn format_result(result: &ElsResult) -> String {
    format!(
        "{} skip {} {} start {} span {} gematria {} | {}",
        result.word(),
        result.skip_distance(),
        result.direction(),
        result.start_position(),
        result.total_span(),
        result.gematria_value(),
        hebrew::format_positions(&result.positions()),
    )
}

#[must_use]
pub fn format_intersection(intersection: &Intersection<'_>) -> String {
    format!(
        "{} (skip {}, start {}) x {} (skip {}, start {}) at {}",
        intersection.first.word(),
        intersection.first.skip_distance(),
        intersection.first.start_position(),
        intersection.second.word(),
        intersection.second.skip_distance(),
        intersection.second.start_position(),
        hebrew::format_positions(&intersection.points),
    )
}

#[must_use]
pub fn format_analysis(analysis: &NumericAnalysis) -> String {
    let mut properties = Vec::new();
    if analysis.is_prime {
        properties.push("prime");
    }
    if analysis.is_perfect_square {
        properties.push("perfect square");
    }
    if analysis.is_triangular {
        properties.push("triangular");
    }
    if analysis.is_fibonacci {
        properties.push("fibonacci");
    }

    let mut output = format!(
        "Value: {}\nDigit sum: {}\nDigital root: {}",
        analysis.value, analysis.digit_sum, analysis.digital_root
    );
    if !properties.is_empty() {
        let _ = write!(output, "\nProperties: {}", properties.join(", "));
    }
    let factors: Vec<String> = analysis.factors.iter().map(ToString::to_string).collect();
    let _ = write!(output, "\nFactors: {}", factors.join(", "));
    if let Some(meaning) = &analysis.common_meaning {
        let _ = write!(output, "\nMeaning: {meaning}");
    }
    output
}
