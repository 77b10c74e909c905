//! Canonical page numbering
//!
//! Merges user rules with region-derived readings into one classification
//! per document page, then coalesces the result into display segments.
//!
//! # Precedence
//!
//! For every page: negative rule > positive rule > region readings >
//! unaccounted. Disagreeing region readings make a page a conflict, which
//! is reported instead of classified.
//!
//! # Example
//!
//! ```rust
//! use canonical_pages::canonical::{
//!     CanonicalPageComputer, CanonicalPageRule, PageSource, SegmentFormatter,
//! };
//! use canonical_pages::extract::RegionDerivedPageNumber;
//! use canonical_pages::numeral::NumeralType;
//!
//! let rules = vec![CanonicalPageRule::positive("front", 1, 1, NumeralType::Roman, "i")];
//! let readings = vec![
//!     RegionDerivedPageNumber::new(2, "2", "footer", "Footer"),
//!     RegionDerivedPageNumber::new(3, "3", "footer", "Footer"),
//! ];
//!
//! let map = CanonicalPageComputer::compute(3, &[], &rules, &readings);
//! assert_eq!(map.get(1).map(|info| info.source), Some(PageSource::RulePositive));
//!
//! let segments = SegmentFormatter::format(&map, &rules, &[]);
//! assert_eq!(SegmentFormatter::display(&segments), "i 🔵  2-3 🟢");
//! ```

mod compute;
mod segment;
mod types;

pub use compute::CanonicalPageComputer;
pub use segment::{CanonicalPageSegment, PageSpan, SegmentFormatter};
pub use types::{
    CanonicalPageInfo, CanonicalPageMap, CanonicalPageRule, CanonicalPageStatistics, MapStatus,
    PageColor, PageNumberConflict, PageSource, Result, RuleError, RuleType,
};
