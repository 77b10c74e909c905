//! Page configuration core types
//!
//! Regions and their page-selection policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::ExtractionBox;

// ============================================================
// Constants
// ============================================================

/// Default display color for page-number regions
pub const DEFAULT_PAGE_NUMBER_COLOR: &str = "#C4B5FD";

/// Default display color for exclude/ignore regions
pub const DEFAULT_EXCLUDE_COLOR: &str = "#FCA5A5";

/// Cap on pages listed by [`PageRangeError::OutOfRange`]
pub const MAX_REPORTED_PAGES: usize = 20;

// ============================================================
// Error Types
// ============================================================

/// Page range parsing error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("Invalid page number: {0:?}")]
    InvalidPage(String),

    #[error("Invalid range: start ({start}) > end ({end})")]
    InvertedRange { start: u32, end: u32 },

    #[error("Page range must contain at least one page")]
    Empty,

    #[error("Pages out of range: {pages:?} (max: {max_page})")]
    OutOfRange { pages: Vec<u32>, max_page: u32 },
}

pub type Result<T> = std::result::Result<T, PageRangeError>;

// ============================================================
// Core Data Structures
// ============================================================

/// Purpose of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    /// Text under the box is the printed page number
    PageNumber,
    /// Text under the box is excluded from indexing
    Exclude,
    /// Text under the box is ignored
    Ignore,
}

impl RegionType {
    /// Default display color for this region type
    pub fn default_color(self) -> &'static str {
        match self {
            RegionType::PageNumber => DEFAULT_PAGE_NUMBER_COLOR,
            RegionType::Exclude | RegionType::Ignore => DEFAULT_EXCLUDE_COLOR,
        }
    }
}

/// Page-selection policy of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageConfigMode {
    /// Only `page_number`
    ThisPage,
    /// Every page of the document
    AllPages,
    /// `page_range`, e.g. `"5-20"` or `"7"`
    PageRange,
    /// `page_range` as a comma list, e.g. `"1-2,5-6,8"`
    Custom,
    /// `start_page`, `start_page + 2`, … up to `end_page`
    EveryOther,
}

/// A bounding box on the page plus the pages it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub region_type: RegionType,
    /// Box in extraction coordinates
    pub bbox: ExtractionBox,
    pub page_config_mode: PageConfigMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
    #[serde(default)]
    pub every_other: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except_pages: Vec<u32>,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Region {
    /// Create a region applying to every page
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        region_type: RegionType,
        bbox: ExtractionBox,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            region_type,
            bbox,
            page_config_mode: PageConfigMode::AllPages,
            page_number: None,
            page_range: None,
            every_other: false,
            start_page: None,
            end_page: None,
            except_pages: Vec::new(),
            color: region_type.default_color().to_string(),
            visible: true,
        }
    }

    /// Create a page-number region applying to every page
    pub fn page_number(id: impl Into<String>, name: impl Into<String>, bbox: ExtractionBox) -> Self {
        Self::new(id, name, RegionType::PageNumber, bbox)
    }

    /// Apply to a single page
    #[must_use]
    pub fn on_page(mut self, page: u32) -> Self {
        self.page_config_mode = PageConfigMode::ThisPage;
        self.page_number = Some(page);
        self
    }

    /// Apply to a range expression such as `"3-40"`
    #[must_use]
    pub fn on_range(mut self, range: impl Into<String>) -> Self {
        self.page_config_mode = PageConfigMode::PageRange;
        self.page_range = Some(range.into());
        self
    }

    /// Apply to a comma list such as `"1-2,5-6,8"`
    #[must_use]
    pub fn on_custom(mut self, range: impl Into<String>) -> Self {
        self.page_config_mode = PageConfigMode::Custom;
        self.page_range = Some(range.into());
        self
    }

    /// Apply to every second page from `start` (through `end` if given)
    #[must_use]
    pub fn on_every_other(mut self, start: u32, end: Option<u32>) -> Self {
        self.page_config_mode = PageConfigMode::EveryOther;
        self.every_other = true;
        self.start_page = Some(start);
        self.end_page = end;
        self
    }

    /// Exclude specific pages
    #[must_use]
    pub fn except(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.except_pages = pages.into_iter().collect();
        self
    }

    /// Set the display color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Whether this region yields page numbers
    pub fn is_page_number(&self) -> bool {
        self.region_type == RegionType::PageNumber
    }
}
