//! Page configuration module
//!
//! Regions are user-drawn boxes with a page-selection policy. This module
//! resolves that policy into concrete document pages.
//!
//! # Features
//!
//! - `this_page`, `all_pages`, `page_range`, `custom` and `every_other` modes
//! - Comma-separated range lists (`"1-2,5-6,8"`)
//! - Every-other filtering and explicit page exceptions
//! - Range validation and human-readable summaries
//!
//! # Example
//!
//! ```rust
//! use canonical_pages::{ApplicablePagesResolver, ExtractionBox, Region};
//!
//! let region = Region::page_number("footer", "Footer", ExtractionBox::new(280.0, 20.0, 330.0, 40.0))
//!     .on_range("3-9")
//!     .except([5]);
//!
//! assert_eq!(ApplicablePagesResolver::resolve(&region, 8), vec![3, 4, 6, 7, 8]);
//! ```

// Submodules
mod resolve;
mod types;

// Re-export public API
pub use resolve::ApplicablePagesResolver;
pub use types::{
    PageConfigMode, PageRangeError, Region, RegionType, Result, DEFAULT_EXCLUDE_COLOR,
    DEFAULT_PAGE_NUMBER_COLOR, MAX_REPORTED_PAGES,
};
