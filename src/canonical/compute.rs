//! Canonical page computation
//!
//! Each document page is classified independently with a strict precedence:
//! negative rule, then positive rule, then region readings, then unaccounted.

use std::collections::{BTreeMap, HashMap};

use super::types::{
    CanonicalPageInfo, CanonicalPageMap, CanonicalPageRule, PageNumberConflict,
};
use crate::extract::RegionDerivedPageNumber;
use crate::page_config::Region;

/// Merges rules and region readings into a per-page canonical map
pub struct CanonicalPageComputer;

impl CanonicalPageComputer {
    /// Compute the canonical page map.
    ///
    /// - Pages covered by a negative rule carry no canonical value.
    /// - Among positive rules covering a page, the last one that can label it wins.
    /// - One reading, or several agreeing readings, give a region-sourced page.
    /// - Disagreeing readings make the page a conflict: it is left out of
    ///   `pages` and reported in `conflicts`.
    /// - If no page ends up with a canonical value, `pages` is emptied.
    ///
    /// `regions` supplies current region names for conflict reports.
    pub fn compute(
        document_page_count: u32,
        regions: &[Region],
        rules: &[CanonicalPageRule],
        readings: &[RegionDerivedPageNumber],
    ) -> CanonicalPageMap {
        for rule in rules {
            if let Err(e) = rule.validate() {
                tracing::warn!(rule_id = %rule.id, error = %e, "Invalid canonical page rule");
            }
        }

        let by_page = Self::group_readings(document_page_count, readings);
        let names: HashMap<&str, &str> = regions
            .iter()
            .map(|r| (r.id.as_str(), r.name.as_str()))
            .collect();

        let mut pages = BTreeMap::new();
        let mut conflicts = Vec::new();

        for page in 1..=document_page_count {
            if let Some(rule) = rules.iter().rev().find(|r| r.is_negative() && r.covers(page)) {
                pages.insert(page, CanonicalPageInfo::rule_negative(&rule.id));
                continue;
            }

            let positive = rules
                .iter()
                .rev()
                .filter(|r| !r.is_negative())
                .find_map(|r| r.canonical_for(page).map(|value| (r, value)));
            if let Some((rule, value)) = positive {
                pages.insert(page, CanonicalPageInfo::rule_positive(value, &rule.id));
                continue;
            }

            let page_readings = by_page.get(&page).map(Vec::as_slice).unwrap_or_default();
            match Self::agreed_value(page_readings) {
                Agreement::None => {
                    pages.insert(page, CanonicalPageInfo::unaccounted());
                }
                Agreement::Agreed(value) => {
                    let mut region_ids: Vec<String> = Vec::new();
                    for reading in page_readings {
                        if !region_ids.contains(&reading.region_id) {
                            region_ids.push(reading.region_id.clone());
                        }
                    }
                    pages.insert(page, CanonicalPageInfo::region(value.to_string(), region_ids));
                }
                Agreement::Conflict => {
                    tracing::debug!(page, readings = page_readings.len(), "Page number conflict");
                    conflicts.push(PageNumberConflict {
                        document_page: page,
                        readings: page_readings
                            .iter()
                            .map(|reading| {
                                let mut reading = (*reading).clone();
                                if let Some(name) = names.get(reading.region_id.as_str()) {
                                    reading.region_name = (*name).to_string();
                                }
                                reading
                            })
                            .collect(),
                    });
                }
            }
        }

        if !pages.values().any(|info| info.canonical_page.is_some()) {
            if document_page_count > 0 {
                tracing::warn!(
                    document_page_count,
                    conflicts = conflicts.len(),
                    "No canonical page could be derived"
                );
            }
            pages.clear();
        }

        CanonicalPageMap {
            document_page_count,
            pages,
            conflicts,
        }
    }

    /// Pages where region readings disagree, without applying rules
    pub fn detect_conflicts(
        document_page_count: u32,
        readings: &[RegionDerivedPageNumber],
    ) -> Vec<PageNumberConflict> {
        Self::group_readings(document_page_count, readings)
            .into_iter()
            .filter(|(_, page_readings)| {
                matches!(Self::agreed_value(page_readings), Agreement::Conflict)
            })
            .map(|(page, page_readings)| PageNumberConflict {
                document_page: page,
                readings: page_readings.into_iter().cloned().collect(),
            })
            .collect()
    }

    fn group_readings(
        document_page_count: u32,
        readings: &[RegionDerivedPageNumber],
    ) -> BTreeMap<u32, Vec<&RegionDerivedPageNumber>> {
        let mut by_page: BTreeMap<u32, Vec<&RegionDerivedPageNumber>> = BTreeMap::new();
        for reading in readings {
            if reading.document_page == 0 || reading.document_page > document_page_count {
                tracing::debug!(
                    page = reading.document_page,
                    region = %reading.region_id,
                    "Ignoring reading outside the document"
                );
                continue;
            }
            by_page.entry(reading.document_page).or_default().push(reading);
        }
        by_page
    }

    fn agreed_value<'a>(readings: &[&'a RegionDerivedPageNumber]) -> Agreement<'a> {
        let Some(first) = readings.first() else {
            return Agreement::None;
        };
        if readings
            .iter()
            .all(|r| r.canonical_page == first.canonical_page)
        {
            Agreement::Agreed(&first.canonical_page)
        } else {
            Agreement::Conflict
        }
    }
}

enum Agreement<'a> {
    None,
    Agreed(&'a str),
    Conflict,
}
