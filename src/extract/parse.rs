//! Page token parsing
//!
//! Raw text under a page-number box is noisy. Only text that reads as a
//! single label becomes a token; anything else produces no reading.

use super::types::PageToken;
use crate::numeral::{parse_roman, NumeralType};

/// Parse raw page text into a canonical page token.
///
/// - all digits → arabic
/// - a valid roman numeral → roman
/// - a single alphabetic word → arbitrary
/// - anything else (empty, punctuation, several words) → `None`
pub fn parse_page_token(raw: &str) -> Option<PageToken> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let numeral_type = if value.chars().all(|c| c.is_ascii_digit()) {
        NumeralType::Arabic
    } else if parse_roman(value).is_some() {
        NumeralType::Roman
    } else if value.chars().all(|c| c.is_ascii_alphabetic()) {
        NumeralType::Arbitrary
    } else {
        return None;
    };

    Some(PageToken {
        value: value.to_string(),
        numeral_type,
    })
}
