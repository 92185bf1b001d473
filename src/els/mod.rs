//! Search result model: letter matches, validated ELS results and result sets.

pub mod result;
pub mod result_set;

pub use result::{Direction, ElsResult, LetterMatch, ResultKey, ResultStatistics};
pub use result_set::{
    CompletionReason, DEFAULT_MAX_RESULTS, DirectionBreakdown, ElsResultSet, FilterCriteria,
    GematriaSummary, RangeSummary, SetStatistics, SortKey, SortOrder, TextProvenance,
    TopCriterion,
};

/// Current time as Unix epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
