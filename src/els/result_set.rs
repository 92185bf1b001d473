//! Bounded collection of results for one query.

use std::cmp::Ordering;
use std::collections::HashSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::els::result::{Direction, ElsResult};

/// Hard cap on the number of results a set will hold.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Field a result set can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    SkipDistance,
    StartPosition,
    TotalSpan,
    #[serde(alias = "gematria")]
    #[value(alias = "gematria")]
    GematriaValue,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Ranking used by [`ElsResultSet::top_results`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum TopCriterion {
    /// Smallest skip first.
    #[default]
    SkipDistance,
    /// Shortest span first.
    TotalSpan,
    /// Highest letters-per-span first.
    Efficiency,
}

/// Why a scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionReason {
    /// Every start position and skip distance was probed.
    #[default]
    Completed,
    Cancelled,
    TimedOut,
    ResultCapReached,
}

/// Where the searched text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextProvenance {
    /// The text provider returned the requested source.
    #[default]
    Loaded,
    /// The provider failed and the built-in sample text was searched instead.
    Fallback,
}

/// Conjunctive bounds for [`ElsResultSet::filter`]. Unset bounds pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub min_skip: Option<usize>,
    pub max_skip: Option<usize>,
    pub min_span: Option<usize>,
    pub max_span: Option<usize>,
    pub direction: Option<Direction>,
    pub min_gematria: Option<u64>,
    pub max_gematria: Option<u64>,
}

impl FilterCriteria {
    #[must_use]
    pub fn matches(&self, result: &ElsResult) -> bool {
        let skip = result.skip_distance();
        let span = result.total_span();
        let gematria = result.gematria_value();

        self.min_skip.is_none_or(|min| skip >= min)
            && self.max_skip.is_none_or(|max| skip <= max)
            && self.min_span.is_none_or(|min| span >= min)
            && self.max_span.is_none_or(|max| span <= max)
            && self.direction.is_none_or(|d| result.direction() == d)
            && self.min_gematria.is_none_or(|min| gematria >= min)
            && self.max_gematria.is_none_or(|max| gematria <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub min: u64,
    pub max: u64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GematriaSummary {
    pub min: u64,
    pub max: u64,
    pub average: f64,
    /// Number of distinct values.
    pub unique: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionBreakdown {
    pub forward: usize,
    pub backward: usize,
}

/// Aggregate view of a result set. The range sections are absent when the
/// set is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatistics {
    pub count: usize,
    pub search_term: String,
    pub text_source: String,
    /// Elapsed search time in milliseconds.
    pub search_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_distance: Option<RangeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_span: Option<RangeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gematria: Option<GematriaSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_breakdown: Option<DirectionBreakdown>,
}

fn summarize(values: &[u64]) -> Option<RangeSummary> {
    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    let total: u128 = values.iter().map(|&v| u128::from(v)).sum();
    Some(RangeSummary {
        min,
        max,
        average: total as f64 / values.len() as f64,
    })
}

/// Results found for one term in one source.
///
/// Populated incrementally while a scan runs, then de-duplicated and sorted
/// once when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResultSetRecord", from = "ResultSetRecord")]
pub struct ElsResultSet {
    search_term: String,
    text_source: String,
    results: Vec<ElsResult>,
    search_start_time: i64,
    search_end_time: Option<i64>,
    max_results: usize,
    sort_by: SortKey,
    sort_order: SortOrder,
    completion_reason: CompletionReason,
    text_provenance: TextProvenance,
}

impl ElsResultSet {
    #[must_use]
    pub fn new(search_term: &str, text_source: &str) -> Self {
        Self::with_max_results(search_term, text_source, DEFAULT_MAX_RESULTS)
    }

    /// A set capped at `max_results` (at least one).
    #[must_use]
    pub fn with_max_results(search_term: &str, text_source: &str, max_results: usize) -> Self {
        Self {
            search_term: search_term.to_string(),
            text_source: text_source.to_string(),
            results: Vec::new(),
            search_start_time: super::now_millis(),
            search_end_time: None,
            max_results: max_results.max(1),
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
            completion_reason: CompletionReason::default(),
            text_provenance: TextProvenance::default(),
        }
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub fn text_source(&self) -> &str {
        &self.text_source
    }

    #[must_use]
    pub fn results(&self) -> &[ElsResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.results.len() >= self.max_results
    }

    #[must_use]
    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    #[must_use]
    pub fn completion_reason(&self) -> CompletionReason {
        self.completion_reason
    }

    #[must_use]
    pub fn text_provenance(&self) -> TextProvenance {
        self.text_provenance
    }

    pub(crate) fn set_text_provenance(&mut self, provenance: TextProvenance) {
        self.text_provenance = provenance;
    }

    #[must_use]
    pub fn search_start_time(&self) -> i64 {
        self.search_start_time
    }

    #[must_use]
    pub fn search_end_time(&self) -> Option<i64> {
        self.search_end_time
    }

    /// Elapsed milliseconds; still running sets measure up to now.
    #[must_use]
    pub fn search_time_ms(&self) -> i64 {
        self.search_end_time.unwrap_or_else(super::now_millis) - self.search_start_time
    }

    /// Append a valid result unless the set is full.
    pub fn add(&mut self, result: ElsResult) -> bool {
        if self.is_full() {
            tracing::debug!(max = self.max_results, "result set is full");
            return false;
        }
        if !result.is_valid() {
            return false;
        }
        self.results.push(result);
        true
    }

    /// Stamp the end time and record why the scan stopped.
    pub fn complete(&mut self, reason: CompletionReason) {
        self.search_end_time = Some(super::now_millis());
        self.completion_reason = reason;
    }

    /// Keep the first result for each identity key, preserving order.
    pub fn deduplicate(&mut self) {
        let mut seen = HashSet::new();
        self.results.retain(|result| seen.insert(result.key()));
    }

    /// Stable sort; `None` reuses the set's current key or order.
    pub fn sort(&mut self, key: Option<SortKey>, order: Option<SortOrder>) {
        let key = key.unwrap_or(self.sort_by);
        let order = order.unwrap_or(self.sort_order);

        self.results.sort_by(|a, b| {
            let ordering = compare_by(key, a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        self.sort_by = key;
        self.sort_order = order;
    }

    #[must_use]
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&ElsResult> {
        self.results.iter().filter(|r| criteria.matches(r)).collect()
    }

    /// Best `count` results by `criterion`, leaving the set's order alone.
    #[must_use]
    pub fn top_results(&self, count: usize, criterion: TopCriterion) -> Vec<&ElsResult> {
        let mut ranked: Vec<&ElsResult> = self.results.iter().collect();

        ranked.sort_by(|a, b| match criterion {
            TopCriterion::SkipDistance => a.skip_distance().cmp(&b.skip_distance()),
            TopCriterion::TotalSpan => a.total_span().cmp(&b.total_span()),
            TopCriterion::Efficiency => b
                .efficiency()
                .partial_cmp(&a.efficiency())
                .unwrap_or(Ordering::Equal),
        });

        ranked.truncate(count);
        ranked
    }

    #[must_use]
    pub fn direction_breakdown(&self) -> DirectionBreakdown {
        let mut breakdown = DirectionBreakdown::default();
        for result in &self.results {
            match result.direction() {
                Direction::Forward => breakdown.forward += 1,
                Direction::Backward => breakdown.backward += 1,
            }
        }
        breakdown
    }

    #[must_use]
    pub fn statistics(&self) -> SetStatistics {
        let mut stats = SetStatistics {
            count: self.results.len(),
            search_term: self.search_term.clone(),
            text_source: self.text_source.clone(),
            search_time: self.search_time_ms(),
            skip_distance: None,
            total_span: None,
            gematria: None,
            direction_breakdown: None,
        };

        if self.results.is_empty() {
            return stats;
        }

        let skips: Vec<u64> = self
            .results
            .iter()
            .map(|r| r.skip_distance() as u64)
            .collect();
        let spans: Vec<u64> = self.results.iter().map(|r| r.total_span() as u64).collect();
        let values: Vec<u64> = self.results.iter().map(ElsResult::gematria_value).collect();

        stats.skip_distance = summarize(&skips);
        stats.total_span = summarize(&spans);
        stats.gematria = summarize(&values).map(|s| GematriaSummary {
            min: s.min,
            max: s.max,
            average: s.average,
            unique: values.iter().collect::<HashSet<_>>().len(),
        });
        stats.direction_breakdown = Some(self.direction_breakdown());
        stats
    }

    /// Export as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Rebuild a set from [`ElsResultSet::to_json`] output.
    ///
    /// Every result is re-validated; invalid records are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not have the exported shape.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn compare_by(key: SortKey, a: &ElsResult, b: &ElsResult) -> Ordering {
    match key {
        SortKey::SkipDistance => a.skip_distance().cmp(&b.skip_distance()),
        SortKey::StartPosition => a.start_position().cmp(&b.start_position()),
        SortKey::TotalSpan => a.total_span().cmp(&b.total_span()),
        SortKey::GematriaValue => a.gematria_value().cmp(&b.gematria_value()),
        SortKey::Timestamp => a.timestamp().cmp(&b.timestamp()),
    }
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetRecord {
    search_term: String,
    text_source: String,
    search_start_time: i64,
    #[serde(default)]
    search_end_time: Option<i64>,
    #[serde(default)]
    search_time: i64,
    #[serde(default)]
    result_count: usize,
    #[serde(default = "default_max_results")]
    max_results: usize,
    results: Vec<ElsResult>,
    #[serde(default)]
    statistics: Option<SetStatistics>,
    #[serde(default)]
    sort_by: SortKey,
    #[serde(default)]
    sort_order: SortOrder,
    #[serde(default)]
    completion_reason: CompletionReason,
    #[serde(default)]
    text_provenance: TextProvenance,
}

impl From<ElsResultSet> for ResultSetRecord {
    fn from(set: ElsResultSet) -> Self {
        let statistics = set.statistics();
        Self {
            search_time: set.search_time_ms(),
            result_count: set.results.len(),
            statistics: Some(statistics),
            search_term: set.search_term,
            text_source: set.text_source,
            search_start_time: set.search_start_time,
            search_end_time: set.search_end_time,
            max_results: set.max_results,
            results: set.results,
            sort_by: set.sort_by,
            sort_order: set.sort_order,
            completion_reason: set.completion_reason,
            text_provenance: set.text_provenance,
        }
    }
}

impl From<ResultSetRecord> for ElsResultSet {
    fn from(record: ResultSetRecord) -> Self {
        let mut set =
            Self::with_max_results(&record.search_term, &record.text_source, record.max_results);
        set.search_start_time = record.search_start_time;
        set.search_end_time = record.search_end_time;
        set.sort_by = record.sort_by;
        set.sort_order = record.sort_order;
        set.completion_reason = record.completion_reason;
        set.text_provenance = record.text_provenance;

        for result in record.results {
            set.add(result);
        }
        set
    }
}
