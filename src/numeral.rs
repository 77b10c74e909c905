//! Numeral handling for canonical page labels
//!
//! Canonical pages are printed labels: arabic numbers (`1`, `2`, `3`),
//! roman numerals (`i`, `ii`, `iii`) or arbitrary tokens (`A`, `B`, `plate`).
//! This module detects which kind a label is, converts roman numerals, and
//! generates or checks label sequences.

use serde::{Deserialize, Serialize};

// ============================================================
// Constants
// ============================================================

/// Largest value representable as a standard roman numeral
pub const MAX_ROMAN_VALUE: u32 = 3999;

const ROMAN_TABLE: [(&str, u32); 13] = [
    ("m", 1000),
    ("cm", 900),
    ("d", 500),
    ("cd", 400),
    ("c", 100),
    ("xc", 90),
    ("l", 50),
    ("xl", 40),
    ("x", 10),
    ("ix", 9),
    ("v", 5),
    ("iv", 4),
    ("i", 1),
];

// ============================================================
// Numeral Type
// ============================================================

/// Kind of label a canonical page carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumeralType {
    /// Decimal digits
    Arabic,
    /// Roman numeral letters
    Roman,
    /// Any other token
    Arbitrary,
}

/// Detect the numeral type of a canonical page label.
///
/// Only the character class is inspected: `"mix"` is roman even though it
/// also reads as a word.
pub fn detect_numeral_type(page: &str) -> NumeralType {
    if !page.is_empty() && page.chars().all(|c| c.is_ascii_digit()) {
        NumeralType::Arabic
    } else if !page.is_empty() && page.chars().all(is_roman_letter) {
        NumeralType::Roman
    } else {
        NumeralType::Arbitrary
    }
}

fn is_roman_letter(c: char) -> bool {
    matches!(
        c.to_ascii_lowercase(),
        'i' | 'v' | 'x' | 'l' | 'c' | 'd' | 'm'
    )
}

// ============================================================
// Roman Numerals
// ============================================================

/// Parse a roman numeral (case-insensitive).
///
/// Only canonical numerals in 1..=3999 parse. Empty input, non-roman
/// characters, letter orders the subtractive table cannot consume (`"im"`)
/// and non-canonical spellings (`"iiii"`, `"mmmm"`) all yield `None`.
pub fn parse_roman(text: &str) -> Option<u32> {
    let text = text.trim().to_ascii_lowercase();
    let mut result = 0;
    let mut remaining = text.as_str();

    for (numeral, value) in &ROMAN_TABLE {
        while remaining.starts_with(numeral) {
            result += value;
            remaining = &remaining[numeral.len()..];
        }
    }

    if !remaining.is_empty() {
        return None;
    }
    // Round-trip rejects repeated or out-of-range spellings
    to_roman(result).filter(|canonical| *canonical == text).map(|_| result)
}

/// Format a number as a lowercase roman numeral (1..=3999)
pub fn to_roman(value: u32) -> Option<String> {
    if value == 0 || value > MAX_ROMAN_VALUE {
        return None;
    }

    let mut result = String::new();
    let mut remaining = value;
    for (numeral, step) in &ROMAN_TABLE {
        while remaining >= *step {
            result.push_str(numeral);
            remaining -= step;
        }
    }
    Some(result)
}

// ============================================================
// Values and Sequences
// ============================================================

/// Ordinal value of a label, if it has one (arabic or valid roman)
pub fn ordinal_value(page: &str) -> Option<(NumeralType, u32)> {
    match detect_numeral_type(page) {
        NumeralType::Arabic => page.parse::<u32>().ok().map(|n| (NumeralType::Arabic, n)),
        NumeralType::Roman => parse_roman(page).map(|n| (NumeralType::Roman, n)),
        NumeralType::Arbitrary => None,
    }
}

/// Check whether `next` directly follows `prev` in the same numeral system
pub fn is_successor(prev: &str, next: &str) -> bool {
    match (ordinal_value(prev), ordinal_value(next)) {
        (Some((prev_type, a)), Some((next_type, b))) => {
            prev_type == next_type && a.checked_add(1) == Some(b)
        }
        _ => false,
    }
}

/// Label `offset` positions after `start` in the given numeral system.
///
/// Arbitrary labels have no arithmetic and always yield `None`.
pub fn offset_label(numeral_type: NumeralType, start: &str, offset: u32) -> Option<String> {
    match numeral_type {
        NumeralType::Arabic => {
            let start: u32 = start.trim().parse().ok()?;
            start.checked_add(offset).map(|n| n.to_string())
        }
        NumeralType::Roman => {
            let start = parse_roman(start)?;
            to_roman(start.checked_add(offset)?)
        }
        NumeralType::Arbitrary => None,
    }
}

/// Generate `count` consecutive arabic labels starting at `start`
pub fn generate_arabic(start: u32, count: usize) -> Vec<String> {
    (0..count)
        .map_while(|i| u32::try_from(i).ok().and_then(|i| start.checked_add(i)))
        .map(|n| n.to_string())
        .collect()
}

/// Generate `count` consecutive roman labels starting at `start`.
///
/// Returns `None` if `start` is not a roman numeral or the run passes 3999.
pub fn generate_roman(start: &str, count: usize) -> Option<Vec<String>> {
    let first = parse_roman(start)?;
    (0..count)
        .map(|i| {
            let i = u32::try_from(i).ok()?;
            to_roman(first.checked_add(i)?)
        })
        .collect()
}

/// Split comma-separated input into trimmed, non-empty labels
pub fn parse_arbitrary_sequence(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check whether labels form one continuous arabic or roman progression.
///
/// Mixed systems and arbitrary labels are never continuous; fewer than two
/// labels trivially are.
pub fn is_continuous<S: AsRef<str>>(values: &[S]) -> bool {
    if values.len() < 2 {
        return true;
    }
    values
        .windows(2)
        .all(|pair| is_successor(pair[0].as_ref(), pair[1].as_ref()))
}
