//! Segment formatting
//!
//! Coalesces the per-page map into displayable runs of document pages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{CanonicalPageInfo, CanonicalPageMap, CanonicalPageRule, PageColor, PageSource};
use crate::numeral::{is_successor, NumeralType};
use crate::page_config::Region;

/// Inclusive range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan<T> {
    pub start: T,
    pub end: T,
}

impl<T: PartialEq> PageSpan<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

impl<T: std::fmt::Display + PartialEq> std::fmt::Display for PageSpan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A run of consecutive document pages sharing one classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPageSegment {
    pub source: PageSource,
    pub document_page_range: PageSpan<u32>,
    /// Document span as text for negative and unaccounted runs
    pub canonical_page_range: PageSpan<String>,
    pub color: PageColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CanonicalPageSegment {
    /// Number of document pages in the run
    pub fn page_count(&self) -> u32 {
        self.document_page_range.end - self.document_page_range.start + 1
    }
}

/// Builds segments from a computed map
pub struct SegmentFormatter;

impl SegmentFormatter {
    /// Coalesce the map into segments, in document page order.
    ///
    /// Conflict pages belong to no segment and break the run around them.
    /// Region-derived runs merge across regions: consecutive readings from
    /// different regions share one segment, which lists every contributing
    /// region in `region_ids` and `region_names`.
    pub fn format(
        map: &CanonicalPageMap,
        rules: &[CanonicalPageRule],
        regions: &[Region],
    ) -> Vec<CanonicalPageSegment> {
        let rules_by_id: HashMap<&str, &CanonicalPageRule> =
            rules.iter().map(|r| (r.id.as_str(), r)).collect();
        let names: HashMap<&str, &str> = regions
            .iter()
            .map(|r| (r.id.as_str(), r.name.as_str()))
            .collect();

        let mut segments: Vec<CanonicalPageSegment> = Vec::new();
        let mut current: Option<CanonicalPageSegment> = None;

        for page in 1..=map.document_page_count {
            let Some(info) = map.get(page) else {
                segments.extend(current.take());
                continue;
            };

            if let Some(segment) = current.as_mut() {
                if Self::extends(segment, page, info, &rules_by_id) {
                    segment.document_page_range.end = page;
                    segment.canonical_page_range.end = Self::canonical_text(page, info);
                    for id in &info.region_ids {
                        if !segment.region_ids.contains(id) {
                            segment.region_ids.push(id.clone());
                            if let Some(name) = names.get(id.as_str()) {
                                segment.region_names.push((*name).to_string());
                            }
                        }
                    }
                    continue;
                }
            }

            segments.extend(current.take());
            current = Some(Self::start_segment(page, info, &rules_by_id, &names));
        }
        segments.extend(current);
        segments
    }

    /// Compact one-line summary, e.g. `1-19 🔴  i-x 🔵  1-480 🟢  20-22 ⚪ (ignored)`
    pub fn display(segments: &[CanonicalPageSegment]) -> String {
        if segments.is_empty() {
            return "(No pages)".to_string();
        }

        segments
            .iter()
            .map(|segment| {
                let emoji = segment.color.emoji();
                match segment.source {
                    PageSource::RuleNegative => {
                        format!("{} {} (ignored)", segment.document_page_range, emoji)
                    }
                    PageSource::RulePositive | PageSource::Region | PageSource::Unaccounted => {
                        format!("{} {}", segment.canonical_page_range, emoji)
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    fn extends(
        segment: &CanonicalPageSegment,
        page: u32,
        info: &CanonicalPageInfo,
        rules_by_id: &HashMap<&str, &CanonicalPageRule>,
    ) -> bool {
        if segment.document_page_range.end + 1 != page || segment.source != info.source {
            return false;
        }

        let prev = segment.canonical_page_range.end.as_str();
        match info.source {
            PageSource::Unaccounted => true,
            PageSource::RuleNegative => segment.rule_id == info.rule_id,
            PageSource::RulePositive => {
                if segment.rule_id != info.rule_id {
                    return false;
                }
                let arbitrary = info
                    .rule_id
                    .as_deref()
                    .and_then(|id| rules_by_id.get(id))
                    .and_then(|rule| rule.effective_numeral_type())
                    == Some(NumeralType::Arbitrary);
                arbitrary || Self::follows(prev, info)
            }
            PageSource::Region => Self::follows(prev, info),
        }
    }

    fn follows(prev: &str, info: &CanonicalPageInfo) -> bool {
        info.canonical_page
            .as_deref()
            .is_some_and(|next| is_successor(prev, next))
    }

    fn start_segment(
        page: u32,
        info: &CanonicalPageInfo,
        rules_by_id: &HashMap<&str, &CanonicalPageRule>,
        names: &HashMap<&str, &str>,
    ) -> CanonicalPageSegment {
        let text = Self::canonical_text(page, info);
        let label = match info.source {
            PageSource::RulePositive | PageSource::RuleNegative => info
                .rule_id
                .as_deref()
                .and_then(|id| rules_by_id.get(id))
                .and_then(|rule| rule.label.clone())
                .filter(|label| !label.is_empty()),
            PageSource::Region | PageSource::Unaccounted => None,
        };

        CanonicalPageSegment {
            source: info.source,
            document_page_range: PageSpan::new(page, page),
            canonical_page_range: PageSpan::new(text.clone(), text),
            color: info.color,
            rule_id: info.rule_id.clone(),
            region_ids: info.region_ids.clone(),
            region_names: info
                .region_ids
                .iter()
                .filter_map(|id| names.get(id.as_str()).map(|name| (*name).to_string()))
                .collect(),
            label,
        }
    }

    fn canonical_text(page: u32, info: &CanonicalPageInfo) -> String {
        match info.source {
            PageSource::RuleNegative | PageSource::Unaccounted => page.to_string(),
            PageSource::RulePositive | PageSource::Region => info
                .canonical_page
                .clone()
                .unwrap_or_else(|| page.to_string()),
        }
    }
}
