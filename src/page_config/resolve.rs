//! Applicable page resolution
//!
//! Expands a region's page-selection policy into concrete document pages.

use std::collections::BTreeSet;

use super::types::{PageConfigMode, PageRangeError, Region, Result, MAX_REPORTED_PAGES};

/// Resolves which document pages a region applies to
pub struct ApplicablePagesResolver;

impl ApplicablePagesResolver {
    /// Sorted, deduplicated pages in `[1, max_page]` the region applies to.
    ///
    /// A malformed range string yields no pages.
    pub fn resolve(region: &Region, max_page: u32) -> Vec<u32> {
        if max_page == 0 {
            return Vec::new();
        }

        let base: BTreeSet<u32> = match region.page_config_mode {
            PageConfigMode::ThisPage => region.page_number.into_iter().collect(),
            PageConfigMode::AllPages => (1..=max_page).collect(),
            PageConfigMode::PageRange | PageConfigMode::Custom => {
                match region.page_range.as_deref().map(Self::parse_spans) {
                    Some(Ok(spans)) => spans
                        .into_iter()
                        .flat_map(|(start, end)| start.max(1)..=end.min(max_page))
                        .collect(),
                    Some(Err(e)) => {
                        tracing::debug!(
                            region_id = %region.id,
                            error = %e,
                            "Ignoring malformed page range"
                        );
                        return Vec::new();
                    }
                    None => BTreeSet::new(),
                }
            }
            PageConfigMode::EveryOther => {
                let start = region.start_page.unwrap_or(1).max(1);
                let end = region.end_page.unwrap_or(max_page).min(max_page);
                (start..=end).step_by(2).collect()
            }
        };

        base.into_iter()
            .filter(|&page| (1..=max_page).contains(&page))
            .filter(|&page| Self::passes_every_other(region, page))
            .filter(|page| !region.except_pages.contains(page))
            .collect()
    }

    /// Whether the region applies to `page` in a document of `max_page` pages
    pub fn applies_to_page(region: &Region, page: u32, max_page: u32) -> bool {
        Self::resolve(region, max_page).binary_search(&page).is_ok()
    }

    /// `every_other` filter for the non-`every_other` modes
    fn passes_every_other(region: &Region, page: u32) -> bool {
        if !region.every_other {
            return true;
        }
        let Some(start) = region.start_page else {
            return true;
        };
        if page < start || (page - start) % 2 != 0 {
            return false;
        }
        region.end_page.map_or(true, |end| page <= end)
    }

    /// Parse a page range expression.
    ///
    /// Accepts single pages and inclusive ranges separated by commas:
    /// `"10"` → `[10]`, `"1-5"` → `[1..=5]`, `"1-2,5-6,8"` → `[1, 2, 5, 6, 8]`.
    pub fn parse_page_range(range: &str) -> Result<Vec<u32>> {
        let pages: BTreeSet<u32> = Self::parse_spans(range)?
            .into_iter()
            .flat_map(|(start, end)| start..=end)
            .collect();
        Ok(pages.into_iter().collect())
    }

    /// Inclusive `(start, end)` spans of a range expression, unexpanded
    fn parse_spans(range: &str) -> Result<Vec<(u32, u32)>> {
        range
            .split(',')
            .map(str::trim)
            .map(|part| match part.split_once('-') {
                Some((start, end)) => {
                    let start = Self::parse_page(start)?;
                    let end = Self::parse_page(end)?;
                    if start > end {
                        return Err(PageRangeError::InvertedRange { start, end });
                    }
                    Ok((start, end))
                }
                None => Self::parse_page(part).map(|page| (page, page)),
            })
            .collect()
    }

    fn parse_page(text: &str) -> Result<u32> {
        let text = text.trim();
        text.parse::<u32>()
            .map_err(|_| PageRangeError::InvalidPage(text.to_string()))
    }

    /// Validate a page range expression, optionally against the page count.
    ///
    /// Works on the span bounds, so `"1-4000000000"` is checked without
    /// expanding it. At most [`MAX_REPORTED_PAGES`] offending pages are listed.
    pub fn validate_page_range(range: &str, max_page: Option<u32>) -> Result<()> {
        let spans = Self::parse_spans(range)?;
        if spans.is_empty() {
            return Err(PageRangeError::Empty);
        }

        if let Some(max_page) = max_page {
            let invalid: Vec<u32> = spans
                .iter()
                .flat_map(|&(start, end)| {
                    let below = (start == 0).then_some(0);
                    let above = start.max(max_page.saturating_add(1))..=end;
                    below.into_iter().chain(above)
                })
                .take(MAX_REPORTED_PAGES)
                .collect();
            if !invalid.is_empty() {
                return Err(PageRangeError::OutOfRange {
                    pages: invalid,
                    max_page,
                });
            }
        }

        Ok(())
    }

    /// Human-readable summary of the region's page configuration
    pub fn describe(region: &Region) -> String {
        let range = region.page_range.as_deref().unwrap_or("");
        let mut summary = match region.page_config_mode {
            PageConfigMode::ThisPage => match region.page_number {
                Some(page) => format!("Page {page}"),
                None => "No page".to_string(),
            },
            PageConfigMode::AllPages => "All pages".to_string(),
            PageConfigMode::PageRange => format!("Pages {range}"),
            PageConfigMode::Custom => format!("Custom: {range}"),
            PageConfigMode::EveryOther => match (region.start_page, region.end_page) {
                (Some(start), Some(end)) => format!("Every other page, {start}-{end}"),
                (start, None) => format!("Every other page from {}", start.unwrap_or(1)),
                (None, Some(end)) => format!("Every other page, 1-{end}"),
            },
        };

        if region.every_other && region.page_config_mode != PageConfigMode::EveryOther {
            match (region.start_page, region.end_page) {
                (Some(start), Some(end)) => {
                    summary.push_str(&format!(" (every other, {start}-{end})"))
                }
                (Some(start), None) => {
                    summary.push_str(&format!(" (every other, starting page {start})"))
                }
                _ => {}
            }
        }

        if !region.except_pages.is_empty() {
            let pages: Vec<String> = region.except_pages.iter().map(u32::to_string).collect();
            summary.push_str(&format!(" except {}", pages.join(", ")));
        }

        summary
    }
}
