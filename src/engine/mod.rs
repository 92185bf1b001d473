//! ELS search engine.
//!
//! [`ElsEngine`] validates a term, resolves the source text through a
//! [`TextProvider`], and probes every start position and skip distance in
//! fixed-size chunks. Cancellation and the timeout are checked only between
//! chunks, and progress is reported after each one.
//!
//! Backward results read the term right to left through the text: the
//! letter at match `i` sits at `start - i * skip`. They come from the same
//! chunked scan run over the reversed letters, with every position mapped
//! back through `len - 1 - p`.

mod cache;
mod context;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use cache::FifoCache;
pub use context::{CancelHandle, SearchProgress, SearchStatus};

use crate::els::{
    CompletionReason, DEFAULT_MAX_RESULTS, Direction, ElsResult, ElsResultSet, LetterMatch,
    TextProvenance,
};
use crate::hebrew::{self, TermError};
use crate::provider::TextProvider;
use context::{ActiveGuard, ActiveSlot, SearchContext};

/// Entries kept in each engine cache unless configured otherwise.
pub const DEFAULT_CACHE_SIZE: usize = 10;

/// Errors that reject a search before it scans.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] TermError),

    #[error("Search term is empty after normalization")]
    EmptyTerm,

    #[error("Invalid search options: {0}")]
    InvalidOptions(String),

    #[error("No search direction selected; enable forward or backward")]
    NoDirection,
}

/// Tunables for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub min_skip_distance: usize,
    pub max_skip_distance: usize,
    pub search_forward: bool,
    pub search_backward: bool,
    pub max_results: usize,
    pub timeout_ms: u64,
    /// Start positions probed between two checkpoints.
    pub chunk_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_skip_distance: 1,
            max_skip_distance: 1000,
            search_forward: true,
            search_backward: false,
            max_results: DEFAULT_MAX_RESULTS,
            timeout_ms: 60_000,
            chunk_size: 1000,
        }
    }
}

impl SearchOptions {
    /// Check the option invariants.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidOptions` for out-of-range values and
    /// `SearchError::NoDirection` when both directions are disabled.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_skip_distance == 0 {
            return Err(SearchError::InvalidOptions(
                "minimum skip distance must be at least 1".to_string(),
            ));
        }
        if self.max_skip_distance < self.min_skip_distance {
            return Err(SearchError::InvalidOptions(format!(
                "maximum skip distance {} is below minimum {}",
                self.max_skip_distance, self.min_skip_distance
            )));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidOptions(
                "max results must be positive".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(SearchError::InvalidOptions(
                "timeout must be positive".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(SearchError::InvalidOptions(
                "chunk size must be positive".to_string(),
            ));
        }
        if !self.search_forward && !self.search_backward {
            return Err(SearchError::NoDirection);
        }
        Ok(())
    }

    fn direction_count(&self) -> u64 {
        u64::from(self.search_forward) + u64::from(self.search_backward)
    }

    fn skip_count(&self) -> u64 {
        (self.max_skip_distance - self.min_skip_distance + 1) as u64
    }
}

/// Identity of a cached search: only the options that change the results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    term: String,
    source: String,
    min_skip: usize,
    max_skip: usize,
    forward: bool,
    backward: bool,
}

impl CacheKey {
    fn new(term: &str, source: &str, options: &SearchOptions) -> Self {
        Self {
            term: term.to_string(),
            source: source.to_string(),
            min_skip: options.min_skip_distance,
            max_skip: options.max_skip_distance,
            forward: options.search_forward,
            backward: options.search_backward,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}",
            self.term, self.source, self.min_skip, self.max_skip, self.forward, self.backward
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub text_cache_size: usize,
    pub result_cache_size: usize,
    pub max_cache_size: usize,
    /// Oldest first.
    pub text_sources: Vec<String>,
    /// Oldest first.
    pub cached_searches: Vec<String>,
}

/// ELS search over texts supplied by `P`.
///
/// Holds two FIFO caches (normalized text per source, result set per
/// query) and the context of the search in flight. A search borrows the
/// engine mutably; use [`ElsEngine::cancel_handle`] to watch or stop it from a
/// progress callback or another thread.
pub struct ElsEngine<P: TextProvider> {
    provider: P,
    text_cache: FifoCache<String, String>,
    result_cache: FifoCache<CacheKey, ElsResultSet>,
    active: ActiveSlot,
}

impl<P: TextProvider> ElsEngine<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_cache_size(provider, DEFAULT_CACHE_SIZE)
    }

    #[must_use]
    pub fn with_cache_size(provider: P, cache_size: usize) -> Self {
        Self {
            provider,
            text_cache: FifoCache::new(cache_size),
            result_cache: FifoCache::new(cache_size),
            active: ActiveSlot::default(),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Search `source_id` for `term` without progress reporting.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the term or the options are rejected.
    pub fn search_els(
        &mut self,
        term: &str,
        source_id: &str,
        options: &SearchOptions,
    ) -> Result<ElsResultSet, SearchError> {
        self.search_els_with_progress(term, source_id, options, &mut |_| {})
    }

    /// Search `source_id` for `term`, calling `on_progress` after every chunk.
    ///
    /// Cached queries return immediately without progress calls. Cancelled
    /// and timed-out scans return their partial results; the set's
    /// completion reason tells them apart from a full scan.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the term or the options are rejected.
    pub fn search_els_with_progress(
        &mut self,
        term: &str,
        source_id: &str,
        options: &SearchOptions,
        on_progress: &mut dyn FnMut(&SearchProgress),
    ) -> Result<ElsResultSet, SearchError> {
        let normalized = hebrew::validate_search_term(term)?;
        options.validate()?;

        let key = CacheKey::new(&normalized, source_id, options);
        if let Some(cached) = self.result_cache.get(&key) {
            tracing::debug!(term = %normalized, source = source_id, "result cache hit");
            return Ok(cached.clone());
        }

        let (text, provenance) = self.resolve_text(source_id);
        let letters = hebrew::to_letter_array(&text);
        let term_letters = hebrew::to_letter_array(&normalized);
        if term_letters.is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let total = total_probes(letters.len(), term_letters.len(), options);
        let context = Arc::new(SearchContext::new(&normalized, total, options.timeout_ms));
        let _active = ActiveGuard::install(&self.active, Arc::clone(&context));

        tracing::debug!(
            term = %normalized,
            source = source_id,
            letters = letters.len(),
            total_probes = total,
            "scanning"
        );

        let mut set = ElsResultSet::with_max_results(&normalized, source_id, options.max_results);
        set.set_text_provenance(provenance);

        let mut reason = CompletionReason::Completed;
        if options.search_forward {
            let scan = Scan {
                letters: &letters,
                term: &term_letters,
                direction: Direction::Forward,
                options,
                context: &context,
            };
            reason = scan.run(&mut set, on_progress);
        }
        if options.search_backward && reason == CompletionReason::Completed {
            let reversed: Vec<char> = letters.iter().rev().copied().collect();
            let scan = Scan {
                letters: &reversed,
                term: &term_letters,
                direction: Direction::Backward,
                options,
                context: &context,
            };
            reason = scan.run(&mut set, on_progress);
        }

        set.complete(reason);
        set.deduplicate();
        set.sort(None, None);

        match reason {
            CompletionReason::Completed => {
                tracing::debug!(term = %normalized, results = set.len(), "search completed");
            }
            CompletionReason::ResultCapReached => {
                tracing::info!(term = %normalized, max = options.max_results, "result cap reached");
            }
            CompletionReason::Cancelled | CompletionReason::TimedOut => {
                tracing::info!(
                    term = %normalized,
                    ?reason,
                    results = set.len(),
                    "search stopped early"
                );
            }
        }

        let cacheable = provenance == TextProvenance::Loaded
            && matches!(
                reason,
                CompletionReason::Completed | CompletionReason::ResultCapReached
            );
        if cacheable {
            self.result_cache.insert(key, set.clone());
        }

        Ok(set)
    }

    /// Normalized text of `source_id`, or the sample text if loading fails.
    fn resolve_text(&mut self, source_id: &str) -> (String, TextProvenance) {
        if let Some(text) = self.text_cache.get(source_id) {
            return (text.clone(), TextProvenance::Loaded);
        }

        match self.provider.load_text(source_id) {
            Ok(raw) => {
                let text = hebrew::normalize(&raw);
                tracing::debug!(source = source_id, letters = text.chars().count(), "text loaded");
                self.text_cache.insert(source_id.to_string(), text.clone());
                (text, TextProvenance::Loaded)
            }
            Err(e) => {
                tracing::warn!(
                    source = source_id,
                    error = %e,
                    "text unavailable, searching the sample text instead"
                );
                (
                    hebrew::normalize(hebrew::sample_text()),
                    TextProvenance::Fallback,
                )
            }
        }
    }

    /// Search each term in turn. A rejected term yields an empty set.
    pub fn search_multiple_terms(
        &mut self,
        terms: &[&str],
        source_id: &str,
        options: &SearchOptions,
    ) -> Vec<(String, ElsResultSet)> {
        terms
            .iter()
            .map(|&term| {
                let set = self.search_els(term, source_id, options).unwrap_or_else(|e| {
                    tracing::error!(term, error = %e, "search failed");
                    let mut empty =
                        ElsResultSet::with_max_results(term, source_id, options.max_results);
                    empty.complete(CompletionReason::Completed);
                    empty
                });
                (term.to_string(), set)
            })
            .collect()
    }

    /// Flag the active search as cancelled. Returns false if none is running.
    pub fn cancel_search(&self) -> bool {
        self.cancel_handle().cancel()
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(&self.active)
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.cancel_handle().is_searching()
    }

    /// Always idle when called between searches; read a live status from
    /// a [`CancelHandle`] inside the progress callback.
    #[must_use]
    pub fn search_status(&self) -> SearchStatus {
        self.cancel_handle().status()
    }

    pub fn clear_caches(&mut self) {
        self.text_cache.clear();
        self.result_cache.clear();
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            text_cache_size: self.text_cache.len(),
            result_cache_size: self.result_cache.len(),
            max_cache_size: self.result_cache.capacity(),
            text_sources: self.text_cache.keys().cloned().collect(),
            cached_searches: self.result_cache.keys().map(ToString::to_string).collect(),
        }
    }
}

/// Probes across every enabled direction, used for progress only.
fn total_probes(text_len: usize, term_len: usize, options: &SearchOptions) -> u64 {
    if text_len < term_len {
        return 0;
    }
    let starts = (text_len - term_len + 1) as u64;
    starts
        .saturating_mul(options.skip_count())
        .saturating_mul(options.direction_count())
}

/// One directional pass over a letter array.
struct Scan<'a> {
    letters: &'a [char],
    term: &'a [char],
    direction: Direction,
    options: &'a SearchOptions,
    context: &'a SearchContext,
}

impl Scan<'_> {
    fn run(
        &self,
        set: &mut ElsResultSet,
        on_progress: &mut dyn FnMut(&SearchProgress),
    ) -> CompletionReason {
        let text_len = self.letters.len();
        let term_len = self.term.len();
        if text_len < term_len {
            return CompletionReason::Completed;
        }

        let starts = text_len - term_len + 1;
        let skip_count = self.options.skip_count();
        let mut chunk_start = 0;

        while chunk_start < starts {
            if let Some(reason) = self.context.stop_reason() {
                return reason;
            }

            let chunk_end = chunk_start.saturating_add(self.options.chunk_size).min(starts);
            for start in chunk_start..chunk_end {
                if self.probe_start(start, set) {
                    self.context
                        .advance((start - chunk_start + 1) as u64 * skip_count);
                    on_progress(&self.context.progress());
                    return CompletionReason::ResultCapReached;
                }
            }

            self.context
                .advance((chunk_end - chunk_start) as u64 * skip_count);
            on_progress(&self.context.progress());
            chunk_start = chunk_end;
            std::thread::yield_now();
        }

        CompletionReason::Completed
    }

    /// Probe every skip from `start`. Returns true once the set is full.
    fn probe_start(&self, start: usize, set: &mut ElsResultSet) -> bool {
        let last_index = self.term.len() - 1;

        for skip in self.options.min_skip_distance..=self.options.max_skip_distance {
            let in_range = last_index
                .checked_mul(skip)
                .and_then(|span| span.checked_add(start))
                .is_some_and(|end| end < self.letters.len());
            // Larger skips only reach further.
            if !in_range {
                break;
            }

            let hit = self
                .term
                .iter()
                .enumerate()
                .all(|(i, &letter)| self.letters[start + i * skip] == letter);
            if hit {
                set.add(self.build_result(start, skip));
                if set.is_full() {
                    return true;
                }
            }
        }
        false
    }

    fn build_result(&self, start: usize, skip: usize) -> ElsResult {
        let last = self.letters.len() - 1;
        let to_text = |p: usize| match self.direction {
            Direction::Forward => p,
            Direction::Backward => last - p,
        };

        let matches = self
            .term
            .iter()
            .enumerate()
            .map(|(i, &letter)| LetterMatch::new(letter, to_text(start + i * skip)))
            .collect();
        let term: String = self.term.iter().collect();

        ElsResult::new(&term, matches, skip, to_text(start), self.direction)
    }
}

/// How many letters two results share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntersectionKind {
    Single,
    Multiple,
}

/// Two results that share at least one text position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection<'a> {
    pub first: &'a ElsResult,
    pub second: &'a ElsResult,
    /// Shared positions, in the first result's letter order.
    pub points: Vec<usize>,
    pub kind: IntersectionKind,
}

/// Every pair of results from `first` and `second` that cross.
#[must_use]
pub fn find_intersections<'a>(
    first: &'a ElsResultSet,
    second: &'a ElsResultSet,
) -> Vec<Intersection<'a>> {
    let mut intersections = Vec::new();

    for a in first.results() {
        for b in second.results() {
            let other: HashSet<usize> = b.positions().into_iter().collect();
            let points: Vec<usize> = a
                .positions()
                .into_iter()
                .filter(|p| other.contains(p))
                .collect();

            if points.is_empty() {
                continue;
            }
            let kind = if points.len() == 1 {
                IntersectionKind::Single
            } else {
                IntersectionKind::Multiple
            };
            intersections.push(Intersection {
                first: a,
                second: b,
                points,
                kind,
            });
        }
    }

    intersections
}
