//! A single validated equidistant letter sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gematria::{self, NumericAnalysis};
use crate::hebrew;

/// Reading direction of a sequence through the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Positions increase by the skip distance.
    Forward,
    /// Positions decrease by the skip distance.
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// One letter of a sequence and where it sits in the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "LetterMatchRecord", from = "LetterMatchRecord")]
pub struct LetterMatch {
    pub letter: char,
    /// Index into the normalized text.
    pub position: usize,
    /// Index into the un-normalized source; equals `position` when no
    /// richer mapping exists.
    pub source_index: usize,
    /// Verse reference (book:chapter:verse) when known.
    pub verse_ref: Option<String>,
}

impl LetterMatch {
    #[must_use]
    pub fn new(letter: char, position: usize) -> Self {
        Self {
            letter,
            position,
            source_index: position,
            verse_ref: None,
        }
    }
}

impl fmt::Display for LetterMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.letter, self.position)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LetterMatchRecord {
    letter: char,
    #[serde(default)]
    letter_number: u32,
    #[serde(default)]
    gematria_value: u64,
    position: usize,
    source_index: usize,
    #[serde(default)]
    verse_reference: Option<String>,
}

impl From<LetterMatch> for LetterMatchRecord {
    fn from(m: LetterMatch) -> Self {
        Self {
            letter: m.letter,
            letter_number: hebrew::letter_to_number(m.letter),
            gematria_value: gematria::standard_value(m.letter),
            position: m.position,
            source_index: m.source_index,
            verse_reference: m.verse_ref,
        }
    }
}

impl From<LetterMatchRecord> for LetterMatch {
    fn from(r: LetterMatchRecord) -> Self {
        Self {
            letter: r.letter,
            position: r.position,
            source_index: r.source_index,
            verse_ref: r.verse_reference,
        }
    }
}

/// Identity of a result for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub term: String,
    pub start_position: usize,
    pub skip_distance: usize,
    pub direction: Direction,
}

/// Derived measures of a single result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStatistics {
    pub term_length: usize,
    pub skip_distance: usize,
    pub total_span: usize,
    /// Letters per position spanned.
    pub efficiency: f64,
    pub density: f64,
    pub gematria_value: u64,
    pub gematria_analysis: NumericAnalysis,
}

/// A complete sequence spelling a term at a fixed skip distance.
///
/// Built through [`ElsResult::new`], which derives the end position, span and
/// gematria value and checks the letters and spacing. Callers keep only
/// results for which [`ElsResult::is_valid`] holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResultRecord", from = "ResultRecord")]
pub struct ElsResult {
    search_term: String,
    normalized_term: String,
    matches: Vec<LetterMatch>,
    skip_distance: usize,
    start_position: usize,
    direction: Direction,
    end_position: usize,
    total_span: usize,
    gematria_value: u64,
    timestamp: i64,
    is_valid: bool,
}

impl ElsResult {
    #[must_use]
    pub fn new(
        search_term: &str,
        matches: Vec<LetterMatch>,
        skip_distance: usize,
        start_position: usize,
        direction: Direction,
    ) -> Self {
        let normalized_term = hebrew::normalize(search_term);
        let end_position = matches.last().map_or(start_position, |m| m.position);
        let is_valid = validate(
            &normalized_term,
            &matches,
            skip_distance,
            start_position,
            direction,
        );

        Self {
            search_term: search_term.to_string(),
            gematria_value: gematria::calculate_standard(&normalized_term),
            normalized_term,
            matches,
            skip_distance,
            start_position,
            direction,
            end_position,
            total_span: end_position.abs_diff(start_position),
            timestamp: super::now_millis(),
            is_valid,
        }
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub fn normalized_term(&self) -> &str {
        &self.normalized_term
    }

    #[must_use]
    pub fn matches(&self) -> &[LetterMatch] {
        &self.matches
    }

    #[must_use]
    pub fn skip_distance(&self) -> usize {
        self.skip_distance
    }

    #[must_use]
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Position of the last letter.
    #[must_use]
    pub fn end_position(&self) -> usize {
        self.end_position
    }

    /// Distance between the first and last letter.
    #[must_use]
    pub fn total_span(&self) -> usize {
        self.total_span
    }

    #[must_use]
    pub fn gematria_value(&self) -> u64 {
        self.gematria_value
    }

    /// Creation time in Unix epoch milliseconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn term_length(&self) -> usize {
        self.normalized_term.chars().count()
    }

    #[must_use]
    pub fn positions(&self) -> Vec<usize> {
        self.matches.iter().map(|m| m.position).collect()
    }

    /// The letters actually read from the text.
    #[must_use]
    pub fn word(&self) -> String {
        self.matches.iter().map(|m| m.letter).collect()
    }

    #[must_use]
    pub fn key(&self) -> ResultKey {
        ResultKey {
            term: self.normalized_term.clone(),
            start_position: self.start_position,
            skip_distance: self.skip_distance,
            direction: self.direction,
        }
    }

    /// Stable textual identifier, e.g. `els_22_0_7_forward`.
    #[must_use]
    pub fn id(&self) -> String {
        let term_hash: u32 = self
            .normalized_term
            .chars()
            .map(hebrew::letter_to_number)
            .sum();
        format!(
            "els_{term_hash}_{}_{}_{}",
            self.start_position, self.skip_distance, self.direction
        )
    }

    /// Term letters per position spanned; higher is tighter.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.total_span == 0 {
            return 0.0;
        }
        self.term_length() as f64 / self.total_span as f64
    }

    #[must_use]
    pub fn statistics(&self) -> ResultStatistics {
        ResultStatistics {
            term_length: self.term_length(),
            skip_distance: self.skip_distance,
            total_span: self.total_span,
            efficiency: self.efficiency(),
            density: if self.skip_distance > 0 {
                1.0 / self.skip_distance as f64
            } else {
                0.0
            },
            gematria_value: self.gematria_value,
            gematria_analysis: gematria::analyze(self.gematria_value),
        }
    }
}

/// Letters must spell the term and sit exactly `skip` apart, stepping up for
/// forward results and down for backward ones, starting at `start`.
fn validate(
    normalized_term: &str,
    matches: &[LetterMatch],
    skip: usize,
    start: usize,
    direction: Direction,
) -> bool {
    if skip == 0 || matches.is_empty() {
        return false;
    }

    let letters: Vec<char> = normalized_term.chars().collect();
    if letters.len() != matches.len() {
        return false;
    }

    letters.iter().zip(matches).enumerate().all(|(i, (&letter, m))| {
        let expected = i.checked_mul(skip).and_then(|offset| match direction {
            Direction::Forward => start.checked_add(offset),
            Direction::Backward => start.checked_sub(offset),
        });
        m.letter == letter && expected == Some(m.position)
    })
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultRecord {
    search_term: String,
    #[serde(default)]
    normalized_term: String,
    matches: Vec<LetterMatch>,
    skip_distance: usize,
    start_position: usize,
    direction: Direction,
    #[serde(default)]
    end_position: usize,
    #[serde(default)]
    total_span: usize,
    #[serde(default)]
    gematria_value: u64,
    #[serde(default)]
    statistics: Option<ResultStatistics>,
    #[serde(default)]
    id: String,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    is_valid: bool,
}

impl From<ElsResult> for ResultRecord {
    fn from(result: ElsResult) -> Self {
        let statistics = result.statistics();
        let id = result.id();
        Self {
            search_term: result.search_term,
            normalized_term: result.normalized_term,
            matches: result.matches,
            skip_distance: result.skip_distance,
            start_position: result.start_position,
            direction: result.direction,
            end_position: result.end_position,
            total_span: result.total_span,
            gematria_value: result.gematria_value,
            statistics: Some(statistics),
            id,
            timestamp: result.timestamp,
            is_valid: result.is_valid,
        }
    }
}

// Derived fields in the record are ignored: they are recomputed and the
// result is validated again.
impl From<ResultRecord> for ElsResult {
    fn from(record: ResultRecord) -> Self {
        let mut result = Self::new(
            &record.search_term,
            record.matches,
            record.skip_distance,
            record.start_position,
            record.direction,
        );
        if record.timestamp != 0 {
            result.timestamp = record.timestamp;
        }
        result
    }
}
