//! Hebrew text normalization and validation.
//!
//! Every search works over a *normalized* text: the bare letters of the
//! Hebrew block (U+05D0..=U+05EA) with vowel points, cantillation, maqaf,
//! sof pasuq, whitespace and any other symbol removed.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Minimum number of letters in a search term after normalization.
pub const MIN_TERM_LETTERS: usize = 2;

/// Maximum number of letters in a search term after normalization.
pub const MAX_TERM_LETTERS: usize = 20;

const FIRST_LETTER: char = '\u{05D0}';
const LAST_LETTER: char = '\u{05EA}';

/// Word separators besides whitespace: maqaf, paseq, sof pasuq, nun hafukha.
const WORD_SEPARATORS: [char; 4] = ['\u{05BE}', '\u{05C0}', '\u{05C3}', '\u{05C6}'];

const SAMPLE_TEXT: &str = "בראשית ברא אלהים את השמים ואת הארץ והארץ היתה תהו ובהו וחשך על פני תהום ורוח אלהים מרחפת על פני המים ויאמר אלהים יהי אור ויהי אור וירא אלהים את האור כי טוב ויבדל אלהים בין האור ובין החשך ויקרא אלהים לאור יום ולחשך קרא לילה ויהי ערב ויהי בקר יום אחד ויאמר אלהים יהי רקיע בתוך המים ויהי מבדיל בין מים למים ויעש אלהים את הרקיע ויבדל בין המים אשר מתחת לרקיע ובין המים אשר מעל לרקיע ויהי כן ויקרא אלהים לרקיע שמים ויהי ערב ויהי בקר יום שני";

/// Reasons a search term is rejected before any scanning starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    #[error("A search term is required")]
    Empty,

    #[error("The search term must contain Hebrew letters")]
    NotHebrew,

    #[error("The search term must contain at least {min} Hebrew letters (got {0})", min = MIN_TERM_LETTERS)]
    TooShort(usize),

    #[error("The search term cannot contain more than {max} letters (got {0})", max = MAX_TERM_LETTERS)]
    TooLong(usize),
}

/// Returns true for the 27 letters of the Hebrew block, final forms included.
#[must_use]
pub fn is_hebrew_letter(c: char) -> bool {
    (FIRST_LETTER..=LAST_LETTER).contains(&c)
}

/// Reduce raw text to its bare Hebrew letters.
///
/// Total and idempotent: any input yields a (possibly empty) string made only
/// of letters for which [`is_hebrew_letter`] holds.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars().filter(|&c| is_hebrew_letter(c)).collect()
}

/// True when at least one character of `text` is a Hebrew letter.
#[must_use]
pub fn is_hebrew_text(text: &str) -> bool {
    text.chars().any(is_hebrew_letter)
}

/// The single gate in front of every search.
///
/// Returns the normalized term when it holds between [`MIN_TERM_LETTERS`]
/// and [`MAX_TERM_LETTERS`] letters.
///
/// # Errors
///
/// Returns a [`TermError`] describing why the term cannot be searched.
pub fn validate_search_term(term: &str) -> Result<String, TermError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(TermError::Empty);
    }

    if !is_hebrew_text(trimmed) {
        return Err(TermError::NotHebrew);
    }

    let normalized = normalize(trimmed);
    let letters = normalized.chars().count();
    if letters < MIN_TERM_LETTERS {
        return Err(TermError::TooShort(letters));
    }
    if letters > MAX_TERM_LETTERS {
        return Err(TermError::TooLong(letters));
    }

    Ok(normalized)
}

/// Normalize and explode into the engine's working representation.
#[must_use]
pub fn to_letter_array(text: &str) -> Vec<char> {
    text.chars().filter(|&c| is_hebrew_letter(c)).collect()
}

/// Alphabet position of a letter (1 for alef through 22 for tav).
///
/// Final forms share their base letter's position; anything else is 0.
#[must_use]
pub fn letter_to_number(letter: char) -> u32 {
    match letter {
        'א' => 1,
        'ב' => 2,
        'ג' => 3,
        'ד' => 4,
        'ה' => 5,
        'ו' => 6,
        'ז' => 7,
        'ח' => 8,
        'ט' => 9,
        'י' => 10,
        'כ' | 'ך' => 11,
        'ל' => 12,
        'מ' | 'ם' => 13,
        'נ' | 'ן' => 14,
        'ס' => 15,
        'ע' => 16,
        'פ' | 'ף' => 17,
        'צ' | 'ץ' => 18,
        'ק' => 19,
        'ר' => 20,
        'ש' => 21,
        'ת' => 22,
        _ => 0,
    }
}

/// Letter counts of the normalized text, ordered by code point.
#[must_use]
pub fn letter_frequency(text: &str) -> BTreeMap<char, usize> {
    let mut frequency = BTreeMap::new();
    for letter in to_letter_array(text) {
        *frequency.entry(letter).or_insert(0) += 1;
    }
    frequency
}

/// Every normalized position holding `letter`.
#[must_use]
pub fn find_letter_positions(text: &str, letter: char) -> Vec<usize> {
    to_letter_array(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| (c == letter).then_some(i))
        .collect()
}

/// Shape of a list of positions: whether it steps by a constant distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencePattern {
    pub is_valid: bool,
    pub skip_distance: i64,
    pub is_regular: bool,
    pub differences: Vec<i64>,
    pub total_span: i64,
}

/// Describe the step pattern of an ordered position list.
#[must_use]
pub fn analyze_sequence_pattern(positions: &[usize]) -> SequencePattern {
    if positions.len() < 2 {
        return SequencePattern {
            is_valid: false,
            skip_distance: 0,
            is_regular: false,
            differences: Vec::new(),
            total_span: 0,
        };
    }

    #[allow(clippy::cast_possible_wrap)]
    let differences: Vec<i64> = positions
        .windows(2)
        .map(|w| w[1] as i64 - w[0] as i64)
        .collect();
    let first = differences[0];

    #[allow(clippy::cast_possible_wrap)]
    let total_span = positions[positions.len() - 1] as i64 - positions[0] as i64;

    SequencePattern {
        is_valid: true,
        skip_distance: first,
        is_regular: differences.iter().all(|&d| d == first),
        differences,
        total_span,
    }
}

/// Mean letter count of the raw text's words, rounded to two decimals.
#[must_use]
pub fn average_word_length(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split(|c: char| c.is_whitespace() || WORD_SEPARATORS.contains(&c))
        .map(|word| normalize(word).chars().count())
        .filter(|&len| len > 0)
        .collect();

    if lengths.is_empty() {
        return 0.0;
    }

    let total: usize = lengths.iter().sum();
    let average = total as f64 / lengths.len() as f64;
    (average * 100.0).round() / 100.0
}

/// Summary counts over a raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStatistics {
    pub total_letters: usize,
    pub unique_letters: usize,
    pub letter_frequency: BTreeMap<char, usize>,
    pub average_word_length: f64,
}

#[must_use]
pub fn text_statistics(text: &str) -> TextStatistics {
    let letter_frequency = letter_frequency(text);
    TextStatistics {
        total_letters: letter_frequency.values().sum(),
        unique_letters: letter_frequency.len(),
        letter_frequency,
        average_word_length: average_word_length(text),
    }
}

/// The opening verses of Genesis, used when a source cannot be loaded.
#[must_use]
pub fn sample_text() -> &'static str {
    SAMPLE_TEXT
}

/// Comma-separated positions, or a placeholder for an empty list.
#[must_use]
pub fn format_positions(positions: &[usize]) -> String {
    if positions.is_empty() {
        return "no positions".to_string();
    }
    positions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize_tests {
        use super::*;

        #[test]
        fn strips_vowel_points() {
            assert_eq!(normalize("בְּרֵאשִׁית"), "בראשית");
        }

        #[test]
        fn strips_punctuation_and_whitespace() {
            assert_eq!(normalize("ברא, אלהים׃ את־השמים."), "בראאלהיםאתהשמים");
        }

        #[test]
        fn drops_latin_and_digits() {
            assert_eq!(normalize("abc 123 שלום xyz"), "שלום");
        }

        #[test]
        fn keeps_final_forms() {
            assert_eq!(normalize("ך ם ן ף ץ"), "ךםןףץ");
        }

        #[test]
        fn empty_input() {
            assert_eq!(normalize(""), "");
        }

        #[test]
        fn sample_prefix() {
            let normalized = normalize(sample_text());
            assert!(normalized.starts_with("בראשיתבראאלהים"));
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn rejects_empty() {
            assert_eq!(validate_search_term("   "), Err(TermError::Empty));
        }

        #[test]
        fn rejects_non_hebrew() {
            assert_eq!(validate_search_term("torah"), Err(TermError::NotHebrew));
        }

        #[test]
        fn rejects_single_letter() {
            assert_eq!(validate_search_term("א"), Err(TermError::TooShort(1)));
        }

        #[test]
        fn accepts_two_letters() {
            assert_eq!(validate_search_term("בר").as_deref(), Ok("בר"));
        }

        #[test]
        fn accepts_twenty_letters() {
            let term = "א".repeat(20);
            assert!(validate_search_term(&term).is_ok());
        }

        #[test]
        fn rejects_twenty_one_letters() {
            let term = "א".repeat(21);
            assert_eq!(validate_search_term(&term), Err(TermError::TooLong(21)));
        }

        #[test]
        fn returns_normalized_term() {
            assert_eq!(validate_search_term(" תּוֹרָה ").as_deref(), Ok("תורה"));
        }

        #[test]
        fn vowel_points_do_not_count() {
            // Alef with qamats is still a single letter.
            assert_eq!(validate_search_term("אָ"), Err(TermError::TooShort(1)));
        }
    }

    mod statistics_tests {
        use super::*;

        #[test]
        fn letter_numbers() {
            assert_eq!(letter_to_number('א'), 1);
            assert_eq!(letter_to_number('ת'), 22);
            assert_eq!(letter_to_number('ם'), 13);
            assert_eq!(letter_to_number('x'), 0);
        }

        #[test]
        fn frequency_counts() {
            let freq = letter_frequency("ברא בר");
            assert_eq!(freq.get(&'ב'), Some(&2));
            assert_eq!(freq.get(&'ר'), Some(&2));
            assert_eq!(freq.get(&'א'), Some(&1));
        }

        #[test]
        fn letter_positions() {
            assert_eq!(find_letter_positions("בראשית ברא", 'ב'), vec![0, 6]);
        }

        #[test]
        fn regular_pattern() {
            let pattern = analyze_sequence_pattern(&[3, 7, 11]);
            assert!(pattern.is_regular);
            assert_eq!(pattern.skip_distance, 4);
            assert_eq!(pattern.total_span, 8);
        }

        #[test]
        fn irregular_pattern() {
            let pattern = analyze_sequence_pattern(&[0, 2, 7]);
            assert!(!pattern.is_regular);
            assert_eq!(pattern.differences, vec![2, 5]);
        }

        #[test]
        fn short_pattern_is_invalid() {
            assert!(!analyze_sequence_pattern(&[4]).is_valid);
        }

        #[test]
        fn word_lengths() {
            assert!((average_word_length("ברא אלהים") - 4.0).abs() < f64::EPSILON);
            assert!((average_word_length("abc") - 0.0).abs() < f64::EPSILON);
        }

        #[test]
        fn text_stats() {
            let stats = text_statistics("בראשית ברא");
            assert_eq!(stats.total_letters, 9);
            assert_eq!(stats.unique_letters, 6);
        }

        #[test]
        fn positions_format() {
            assert_eq!(format_positions(&[1, 5, 9]), "1, 5, 9");
            assert_eq!(format_positions(&[]), "no positions");
        }
    }
}
