//! Gematria: numeric values of Hebrew letter sequences.
//!
//! Three value tables (standard, mispar katan, ordinal) and the Atbash
//! substitution cipher, plus a handful of numeric predicates used to
//! describe a computed value.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::hebrew;

/// How a letter sequence is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Alef = 1 … tav = 400, finals 500 … 900.
    #[default]
    Standard,
    /// Standard values reduced to a single digit.
    MisparKatan,
    /// Position in the alphabet; finals share their base letter's value.
    Ordinal,
    /// Standard value of the Atbash-substituted text.
    Atbash,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::MisparKatan => "mispar_katan",
            Self::Ordinal => "ordinal",
            Self::Atbash => "atbash",
        };
        f.write_str(name)
    }
}

#[must_use]
pub fn standard_value(letter: char) -> u64 {
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
        'כ' => 20,
        'ל' => 30,
        'מ' => 40,
        'נ' => 50,
        'ס' => 60,
        'ע' => 70,
        'פ' => 80,
        'צ' => 90,
        'ק' => 100,
        'ר' => 200,
        'ש' => 300,
        'ת' => 400,
        'ך' => 500,
        'ם' => 600,
        'ן' => 700,
        'ף' => 800,
        'ץ' => 900,
        _ => 0,
    }
}

#[must_use]
pub fn mispar_katan_value(letter: char) -> u64 {
    match standard_value(letter) {
        0 => 0,
        v => {
            // 10, 100 and 1000 all reduce to 1; finals (500..=900) keep their digit.
            let mut digit = v;
            while digit >= 10 {
                digit /= 10;
            }
            digit
        }
    }
}

#[must_use]
pub fn ordinal_value(letter: char) -> u64 {
    u64::from(hebrew::letter_to_number(letter))
}

/// Atbash partner of a letter (alef ↔ tav, bet ↔ shin, …).
///
/// Final forms map through their base letter.
#[must_use]
pub fn atbash(letter: char) -> Option<char> {
    let mapped = match letter {
        'א' => 'ת',
        'ב' => 'ש',
        'ג' => 'ר',
        'ד' => 'ק',
        'ה' => 'צ',
        'ו' => 'פ',
        'ז' => 'ע',
        'ח' => 'ס',
        'ט' => 'נ',
        'י' => 'מ',
        'כ' | 'ך' => 'ל',
        'ל' => 'כ',
        'מ' | 'ם' => 'י',
        'נ' | 'ן' => 'ט',
        'ס' => 'ח',
        'ע' => 'ז',
        'פ' | 'ף' => 'ו',
        'צ' | 'ץ' => 'ה',
        'ק' => 'ד',
        'ר' => 'ג',
        'ש' => 'ב',
        'ת' => 'א',
        _ => return None,
    };
    Some(mapped)
}

/// Apply the Atbash cipher to the normalized letters of `text`.
#[must_use]
pub fn apply_atbash(text: &str) -> String {
    hebrew::normalize(text)
        .chars()
        .map(|c| atbash(c).unwrap_or(c))
        .collect()
}

fn table_value(letter: char, method: Method) -> u64 {
    match method {
        Method::Standard | Method::Atbash => standard_value(letter),
        Method::MisparKatan => mispar_katan_value(letter),
        Method::Ordinal => ordinal_value(letter),
    }
}

/// Sum of the letter values of the normalized text.
///
/// Letters outside the table contribute 0; empty or non-Hebrew input is 0.
#[must_use]
pub fn value_of(text: &str, method: Method) -> u64 {
    let normalized = match method {
        Method::Atbash => apply_atbash(text),
        _ => hebrew::normalize(text),
    };
    normalized.chars().map(|c| table_value(c, method)).sum()
}

#[must_use]
pub fn calculate_standard(text: &str) -> u64 {
    value_of(text, Method::Standard)
}

/// Atbash text together with its standard value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtbashValue {
    pub text: String,
    pub value: u64,
}

/// Every method applied to one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GematriaReport {
    pub text: String,
    pub normalized: String,
    pub standard: u64,
    pub mispar_katan: u64,
    pub ordinal: u64,
    pub atbash: AtbashValue,
    pub letter_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_meaning: Option<&'static str>,
}

#[must_use]
pub fn calculate_all(text: &str) -> GematriaReport {
    let normalized = hebrew::normalize(text);
    let atbash_text = apply_atbash(&normalized);
    let standard = value_of(&normalized, Method::Standard);

    GematriaReport {
        text: text.to_string(),
        standard,
        mispar_katan: value_of(&normalized, Method::MisparKatan),
        ordinal: value_of(&normalized, Method::Ordinal),
        atbash: AtbashValue {
            value: value_of(&atbash_text, Method::Standard),
            text: atbash_text,
        },
        letter_count: normalized.chars().count(),
        common_meaning: common_meaning(standard),
        normalized,
    }
}

impl fmt::Display for GematriaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Word: {}", self.text)?;
        writeln!(f, "Standard: {}", self.standard)?;
        writeln!(f, "Mispar katan: {}", self.mispar_katan)?;
        write!(f, "Ordinal: {}", self.ordinal)?;
        if self.atbash.text != self.normalized {
            write!(f, "\nAtbash: {} ({})", self.atbash.text, self.atbash.value)?;
        }
        Ok(())
    }
}

/// One letter's contribution to a word's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterValue {
    pub letter: char,
    /// 1-based position in the word.
    pub position: usize,
    pub value: u64,
    pub ordinal: u64,
}

/// Letter-by-letter values; Atbash breaks down the substituted word.
#[must_use]
pub fn letter_breakdown(text: &str, method: Method) -> Vec<LetterValue> {
    let (letters, table) = match method {
        Method::Atbash => (apply_atbash(text), Method::Standard),
        other => (hebrew::normalize(text), other),
    };

    letters
        .chars()
        .enumerate()
        .map(|(i, letter)| LetterValue {
            letter,
            position: i + 1,
            value: table_value(letter, table),
            ordinal: ordinal_value(letter),
        })
        .collect()
}

/// Words from `words` whose value under `method` equals `target`.
#[must_use]
pub fn find_words_with_value<'a>(target: u64, words: &[&'a str], method: Method) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|word| value_of(word, method) == target)
        .collect()
}

#[must_use]
pub fn are_equivalent(first: &str, second: &str, method: Method) -> bool {
    value_of(first, method) == value_of(second, method)
}

/// Well-known standard values, ascending.
pub const COMMON_VALUES: [(u64, &str); 22] = [
    (1, "אחד - Unity"),
    (3, "אב - Father"),
    (5, "ה - The letter Heh"),
    (6, "ו - The letter Vav"),
    (7, "ז - The letter Zayin"),
    (10, "י - The letter Yod"),
    (13, "אחד - One, אהבה - Love"),
    (15, "יה - Divine name"),
    (17, "טוב - Good"),
    (18, "חי - Life"),
    (26, "יהוה - Divine name"),
    (32, "לב - Heart"),
    (36, "אמת - Truth"),
    (72, "חסד - Kindness"),
    (86, "אלהים - God"),
    (91, "אמן - Amen"),
    (136, "קול - Voice"),
    (248, "אברהם - Abraham"),
    (358, "משיח - Messiah"),
    (541, "ישראל - Israel"),
    (611, "תורה - Torah"),
    (913, "בראשית - In the beginning"),
];

#[must_use]
pub fn common_meaning(value: u64) -> Option<&'static str> {
    COMMON_VALUES
        .binary_search_by_key(&value, |&(v, _)| v)
        .ok()
        .map(|i| COMMON_VALUES[i].1)
}

// ---------------------------------------------------------------------------
// Numeric analysis
// ---------------------------------------------------------------------------

/// Numeric properties of a gematria value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericAnalysis {
    pub value: u64,
    pub digital_root: u64,
    pub is_prime: bool,
    pub is_perfect_square: bool,
    pub is_triangular: bool,
    pub is_fibonacci: bool,
    pub factors: Vec<u64>,
    pub digit_sum: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_meaning: Option<String>,
}

#[must_use]
pub fn analyze(value: u64) -> NumericAnalysis {
    NumericAnalysis {
        value,
        digital_root: digital_root(value),
        is_prime: is_prime(value),
        is_perfect_square: is_perfect_square(u128::from(value)),
        is_triangular: is_triangular(value),
        is_fibonacci: is_fibonacci(value),
        factors: factors(value),
        digit_sum: digit_sum(value),
        common_meaning: common_meaning(value).map(str::to_string),
    }
}

#[must_use]
pub fn digit_sum(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Repeated digit sum until a single digit remains.
#[must_use]
pub fn digital_root(n: u64) -> u64 {
    let mut root = n;
    while root >= 10 {
        root = digit_sum(root);
    }
    root
}

/// Trial division by 2, 3 and then 6k ± 1 up to √n.
///
/// Cost grows with √n: values near `u64::MAX` take billions of divisions.
#[must_use]
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let n = u128::from(n);
    let mut i: u128 = 5;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Newton's method from an upper bound.
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[must_use]
pub fn is_perfect_square(n: u128) -> bool {
    let root = isqrt(n);
    root * root == n
}

/// n is triangular iff 8n + 1 is an odd perfect square.
#[must_use]
pub fn is_triangular(n: u64) -> bool {
    let discriminant = 8 * u128::from(n) + 1;
    let root = isqrt(discriminant);
    root * root == discriminant && (root - 1) % 2 == 0
}

/// n is a Fibonacci number iff 5n² + 4 or 5n² − 4 is a perfect square.
#[must_use]
pub fn is_fibonacci(n: u64) -> bool {
    let wide = u128::from(n);
    let Some(five_n_squared) = wide
        .checked_mul(wide)
        .and_then(|sq| sq.checked_mul(5))
        .filter(|v| v.checked_add(4).is_some())
    else {
        // 5n² leaves u128 near u64::MAX; walk the sequence instead.
        let (mut a, mut b) = (0u64, 1u64);
        while b < n {
            let Some(next) = a.checked_add(b) else {
                return false;
            };
            a = b;
            b = next;
        }
        return b == n;
    };

    is_perfect_square(five_n_squared + 4)
        || (five_n_squared >= 4 && is_perfect_square(five_n_squared - 4))
}

/// All divisors of `n` in ascending order (empty for 0).
///
/// Tries every candidate up to √n, so [`analyze`] is only fast for values
/// well below `u64::MAX`.
#[must_use]
pub fn factors(n: u64) -> Vec<u64> {
    let mut small = Vec::new();
    let mut large = Vec::new();

    let mut i: u64 = 1;
    while u128::from(i) * u128::from(i) <= u128::from(n) {
        if n % i == 0 {
            small.push(i);
            if i != n / i {
                large.push(n / i);
            }
        }
        i += 1;
    }

    small.extend(large.into_iter().rev());
    small
}

#[cfg(test)]
mod tests {
    use super::*;

    mod value_tests {
        use super::*;

        #[test]
        fn standard_alef_bet_gimel() {
            assert_eq!(value_of("אבג", Method::Standard), 6);
        }

        #[test]
        fn standard_known_words() {
            assert_eq!(calculate_standard("אמת"), 441);
            assert_eq!(calculate_standard("חי"), 18);
            assert_eq!(calculate_standard("תורה"), 611);
        }

        #[test]
        fn final_forms_standard() {
            assert_eq!(calculate_standard("ם"), 600);
            assert_eq!(calculate_standard("ץ"), 900);
        }

        #[test]
        fn mispar_katan_reduces() {
            assert_eq!(value_of("יקר", Method::MisparKatan), 1 + 1 + 2);
            assert_eq!(value_of("ך", Method::MisparKatan), 5);
        }

        #[test]
        fn ordinal_finals_share_base() {
            assert_eq!(value_of("מם", Method::Ordinal), 26);
            assert_eq!(value_of("ת", Method::Ordinal), 22);
        }

        #[test]
        fn vowel_points_ignored() {
            assert_eq!(calculate_standard("אָבְגַ"), 6);
        }

        #[test]
        fn non_hebrew_is_zero() {
            assert_eq!(calculate_standard("hello"), 0);
            assert_eq!(calculate_standard(""), 0);
        }

        #[test]
        fn atbash_cipher() {
            assert_eq!(apply_atbash("אבג"), "תשר");
            assert_eq!(apply_atbash("ם"), "י");
            assert_eq!(apply_atbash(""), "");
        }

        #[test]
        fn atbash_value() {
            // תשר = 400 + 300 + 200
            assert_eq!(value_of("אבג", Method::Atbash), 900);
        }

        #[test]
        fn report_collects_all_methods() {
            let report = calculate_all("אבג");
            assert_eq!(report.standard, 6);
            assert_eq!(report.ordinal, 6);
            assert_eq!(report.mispar_katan, 6);
            assert_eq!(report.atbash.text, "תשר");
            assert_eq!(report.letter_count, 3);
        }

        #[test]
        fn breakdown_positions_are_one_based() {
            let breakdown = letter_breakdown("כל", Method::Standard);
            assert_eq!(breakdown.len(), 2);
            assert_eq!(breakdown[0].position, 1);
            assert_eq!(breakdown[0].value, 20);
            assert_eq!(breakdown[1].ordinal, 12);
        }

        #[test]
        fn words_with_value() {
            let words = ["חי", "אמת", "יח"];
            assert_eq!(find_words_with_value(18, &words, Method::Standard), vec!["חי", "יח"]);
        }

        #[test]
        fn equivalence() {
            assert!(are_equivalent("חי", "יח", Method::Standard));
            assert!(!are_equivalent("חי", "אמת", Method::Standard));
        }
    }

    mod analysis_tests {
        use super::*;

        #[test]
        fn thirty_six() {
            let analysis = analyze(36);
            assert!(analysis.is_triangular);
            assert!(analysis.is_perfect_square);
            assert!(!analysis.is_prime);
            assert_eq!(analysis.digital_root, 9);
            assert_eq!(analysis.digit_sum, 9);
            assert_eq!(analysis.factors, vec![1, 2, 3, 4, 6, 9, 12, 18, 36]);
        }

        #[test]
        fn primes() {
            for p in [2, 3, 5, 7, 11, 13, 541] {
                assert!(is_prime(p), "{p} should be prime");
            }
            for c in [0, 1, 4, 9, 25, 35, 611] {
                assert!(!is_prime(c), "{c} should not be prime");
            }
        }

        #[test]
        fn fibonacci_membership() {
            for f in [1, 2, 3, 5, 8, 13, 21, 144, 233] {
                assert!(is_fibonacci(f), "{f} should be Fibonacci");
            }
            for n in [4, 6, 7, 100] {
                assert!(!is_fibonacci(n), "{n} should not be Fibonacci");
            }
        }

        #[test]
        fn triangular_membership() {
            for t in [1, 3, 6, 10, 15, 666] {
                assert!(is_triangular(t), "{t} should be triangular");
            }
            assert!(!is_triangular(7));
        }

        #[test]
        fn digital_root_of_large_value() {
            assert_eq!(digital_root(913), 4);
            assert_eq!(digital_root(7), 7);
        }

        #[test]
        fn factors_of_prime() {
            assert_eq!(factors(13), vec![1, 13]);
            assert!(factors(0).is_empty());
        }

        #[test]
        fn common_values_have_meanings() {
            assert_eq!(common_meaning(611), Some("תורה - Torah"));
            assert_eq!(common_meaning(1), Some("אחד - Unity"));
            assert_eq!(common_meaning(612), None);
            assert!(COMMON_VALUES.windows(2).all(|w| w[0].0 < w[1].0));
            assert_eq!(analyze(26).common_meaning.as_deref(), Some("יהוה - Divine name"));
            assert!(analyze(27).common_meaning.is_none());
        }

        #[test]
        fn report_carries_meaning_of_standard_value() {
            assert_eq!(calculate_all("תּוֹרָה").common_meaning, Some("תורה - Torah"));
            assert_eq!(
                calculate_all("בְּרֵאשִׁית").common_meaning,
                Some("בראשית - In the beginning")
            );
            assert!(calculate_all("אבג").common_meaning.is_none());
        }

        #[test]
        fn huge_values_do_not_overflow() {
            assert!(!is_fibonacci(u64::MAX));
            assert!(is_fibonacci(12_200_160_415_121_876_738));
            assert!(!is_perfect_square(u128::from(u64::MAX)));
            assert!(!is_triangular(u64::MAX));
        }
    }
}
