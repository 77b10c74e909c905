//! Canonical pages module core types
//!
//! Rules, per-page classification, the computed page map and its statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::RegionDerivedPageNumber;
use crate::numeral::{detect_numeral_type, offset_label, parse_roman, NumeralType};

// ============================================================
// Error Types
// ============================================================

/// Rule validation error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Document pages start at 1")]
    ZeroPage,

    #[error("Invalid document page range: {start}-{end}")]
    InvertedRange { start: u32, end: u32 },

    #[error("Positive rules need a numeral type")]
    MissingNumeralType,

    #[error("Positive {0:?} rules need a starting canonical page")]
    MissingStartingPage(NumeralType),

    #[error("Starting canonical page {value:?} is not a valid {numeral_type:?} numeral")]
    InvalidStartingPage {
        value: String,
        numeral_type: NumeralType,
    },

    #[error("Arbitrary rules need a canonical page sequence")]
    MissingArbitrarySequence,

    #[error("Arbitrary sequence has {actual} entries for {expected} document pages")]
    SequenceLengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RuleError>;

// ============================================================
// Rules
// ============================================================

/// Whether a rule numbers pages or removes them from numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Positive,
    Negative,
}

/// A user-authored override for a document page range (inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPageRule {
    pub id: String,
    pub rule_type: RuleType,
    pub document_page_start: u32,
    pub document_page_end: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeral_type: Option<NumeralType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_canonical_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbitrary_sequence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CanonicalPageRule {
    /// Positive rule counting up from `starting` in the given numeral system
    pub fn positive(
        id: impl Into<String>,
        start: u32,
        end: u32,
        numeral_type: NumeralType,
        starting: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_type: RuleType::Positive,
            document_page_start: start,
            document_page_end: end,
            numeral_type: Some(numeral_type),
            starting_canonical_page: Some(starting.into()),
            arbitrary_sequence: None,
            label: None,
        }
    }

    /// Positive rule assigning explicit labels page by page
    pub fn arbitrary<S: Into<String>>(
        id: impl Into<String>,
        start: u32,
        end: u32,
        sequence: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_type: RuleType::Positive,
            document_page_start: start,
            document_page_end: end,
            numeral_type: Some(NumeralType::Arbitrary),
            starting_canonical_page: None,
            arbitrary_sequence: Some(sequence.into_iter().map(Into::into).collect()),
            label: None,
        }
    }

    /// Negative rule removing pages from numbering
    pub fn negative(id: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            id: id.into(),
            rule_type: RuleType::Negative,
            document_page_start: start,
            document_page_end: end,
            numeral_type: None,
            starting_canonical_page: None,
            arbitrary_sequence: None,
            label: None,
        }
    }

    /// Set the display label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_negative(&self) -> bool {
        self.rule_type == RuleType::Negative
    }

    /// Whether the rule's document range contains `page`
    pub fn covers(&self, page: u32) -> bool {
        (self.document_page_start..=self.document_page_end).contains(&page)
    }

    /// Number of document pages covered
    pub fn page_count(&self) -> usize {
        if self.document_page_end < self.document_page_start {
            0
        } else {
            (self.document_page_end - self.document_page_start) as usize + 1
        }
    }

    /// Numeral system of the labels this rule produces.
    ///
    /// Falls back to the starting page's character class, then to
    /// arbitrary when only a sequence is given.
    pub fn effective_numeral_type(&self) -> Option<NumeralType> {
        if self.is_negative() {
            return None;
        }
        self.numeral_type
            .or_else(|| self.starting_canonical_page.as_deref().map(detect_numeral_type))
            .or_else(|| self.arbitrary_sequence.as_ref().map(|_| NumeralType::Arbitrary))
    }

    /// Canonical label this rule assigns to `page`.
    ///
    /// `None` for negative rules, uncovered pages, and pages the rule cannot
    /// label (bad start, short sequence, roman overflow).
    pub fn canonical_for(&self, page: u32) -> Option<String> {
        if self.is_negative() || !self.covers(page) {
            return None;
        }
        let offset = page - self.document_page_start;

        match self.effective_numeral_type()? {
            NumeralType::Arbitrary => self
                .arbitrary_sequence
                .as_ref()?
                .get(offset as usize)
                .map(|label| label.trim())
                .filter(|label| !label.is_empty())
                .map(str::to_string),
            numeral_type => {
                offset_label(numeral_type, self.starting_canonical_page.as_deref()?, offset)
            }
        }
    }

    /// Check the rule's invariants
    pub fn validate(&self) -> Result<()> {
        if self.document_page_start == 0 {
            return Err(RuleError::ZeroPage);
        }
        if self.document_page_start > self.document_page_end {
            return Err(RuleError::InvertedRange {
                start: self.document_page_start,
                end: self.document_page_end,
            });
        }
        if self.is_negative() {
            return Ok(());
        }

        let numeral_type = self.numeral_type.ok_or(RuleError::MissingNumeralType)?;
        match numeral_type {
            NumeralType::Arabic | NumeralType::Roman => {
                let start = self
                    .starting_canonical_page
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(RuleError::MissingStartingPage(numeral_type))?;
                let valid = match numeral_type {
                    NumeralType::Arabic => start.parse::<u32>().is_ok(),
                    _ => parse_roman(start).is_some(),
                };
                if !valid {
                    return Err(RuleError::InvalidStartingPage {
                        value: start.to_string(),
                        numeral_type,
                    });
                }
            }
            NumeralType::Arbitrary => {
                let sequence = self
                    .arbitrary_sequence
                    .as_ref()
                    .ok_or(RuleError::MissingArbitrarySequence)?;
                if sequence.len() != self.page_count() {
                    return Err(RuleError::SequenceLengthMismatch {
                        expected: self.page_count(),
                        actual: sequence.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================
// Per-page Classification
// ============================================================

/// Where a page's canonical number came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSource {
    RulePositive,
    RuleNegative,
    Region,
    Unaccounted,
}

impl PageSource {
    /// Display color; a pure function of the source
    pub fn color(self) -> PageColor {
        match self {
            PageSource::RulePositive => PageColor::Blue,
            PageSource::RuleNegative => PageColor::Gray,
            PageSource::Region => PageColor::Green,
            PageSource::Unaccounted => PageColor::Red,
        }
    }
}

/// Display color of a classified page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageColor {
    Red,
    Blue,
    Green,
    Gray,
}

impl PageColor {
    /// Marker used in compact display strings
    pub fn emoji(self) -> &'static str {
        match self {
            PageColor::Red => "🔴",
            PageColor::Blue => "🔵",
            PageColor::Green => "🟢",
            PageColor::Gray => "⚪",
        }
    }
}

/// Classification of one document page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPageInfo {
    /// `None` for negative-rule and unaccounted pages
    pub canonical_page: Option<String>,
    pub source: PageSource,
    pub color: PageColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_ids: Vec<String>,
}

impl CanonicalPageInfo {
    pub fn rule_positive(canonical_page: String, rule_id: &str) -> Self {
        Self::new(Some(canonical_page), PageSource::RulePositive, Some(rule_id), Vec::new())
    }

    pub fn rule_negative(rule_id: &str) -> Self {
        Self::new(None, PageSource::RuleNegative, Some(rule_id), Vec::new())
    }

    pub fn region(canonical_page: String, region_ids: Vec<String>) -> Self {
        Self::new(Some(canonical_page), PageSource::Region, None, region_ids)
    }

    pub fn unaccounted() -> Self {
        Self::new(None, PageSource::Unaccounted, None, Vec::new())
    }

    fn new(
        canonical_page: Option<String>,
        source: PageSource,
        rule_id: Option<&str>,
        region_ids: Vec<String>,
    ) -> Self {
        Self {
            canonical_page,
            source,
            color: source.color(),
            rule_id: rule_id.map(str::to_string),
            region_ids,
        }
    }
}

/// Disagreeing region readings for one document page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNumberConflict {
    pub document_page: u32,
    pub readings: Vec<RegionDerivedPageNumber>,
}

impl PageNumberConflict {
    /// Distinct values read, in first-seen order
    pub fn values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = Vec::new();
        for reading in &self.readings {
            if !values.contains(&reading.canonical_page.as_str()) {
                values.push(&reading.canonical_page);
            }
        }
        values
    }
}

// ============================================================
// Page Map
// ============================================================

/// Overall state of a computed map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapStatus {
    /// The document has no pages
    NoPages,
    /// Pages exist but no canonical number could be derived
    Unresolved,
    /// At least one page carries a canonical number
    Resolved,
}

/// Page counts per source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPageStatistics {
    pub total_pages: usize,
    pub rule_positive_pages: usize,
    pub rule_negative_pages: usize,
    pub region_pages: usize,
    pub unaccounted_pages: usize,
    pub conflict_pages: usize,
}

/// Document page → canonical classification.
///
/// Conflicting pages are absent from `pages` and reported in `conflicts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPageMap {
    pub document_page_count: u32,
    pub pages: BTreeMap<u32, CanonicalPageInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<PageNumberConflict>,
}

impl CanonicalPageMap {
    /// Classification of a document page
    pub fn get(&self, page: u32) -> Option<&CanonicalPageInfo> {
        self.pages.get(&page)
    }

    /// Canonical label of a document page
    pub fn canonical_page(&self, page: u32) -> Option<&str> {
        self.get(page)?.canonical_page.as_deref()
    }

    /// Whether region readings disagree on `page`
    pub fn is_conflict(&self, page: u32) -> bool {
        self.conflicts.iter().any(|c| c.document_page == page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &CanonicalPageInfo)> {
        self.pages.iter().map(|(page, info)| (*page, info))
    }

    pub fn status(&self) -> MapStatus {
        if self.document_page_count == 0 {
            MapStatus::NoPages
        } else if self.pages.is_empty() {
            MapStatus::Unresolved
        } else {
            MapStatus::Resolved
        }
    }

    /// Callers should not display a canonical index yet
    pub fn is_unresolved(&self) -> bool {
        self.status() == MapStatus::Unresolved
    }

    pub fn statistics(&self) -> CanonicalPageStatistics {
        let mut stats = CanonicalPageStatistics {
            total_pages: self.pages.len(),
            conflict_pages: self.conflicts.len(),
            ..Default::default()
        };
        for info in self.pages.values() {
            match info.source {
                PageSource::RulePositive => stats.rule_positive_pages += 1,
                PageSource::RuleNegative => stats.rule_negative_pages += 1,
                PageSource::Region => stats.region_pages += 1,
                PageSource::Unaccounted => stats.unaccounted_pages += 1,
            }
        }
        stats
    }
}
