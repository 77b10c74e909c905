//! canonical-pages - Canonical page numbering for PDF indexing
//!
//! Derives the printed page label of every physical page of a document by
//! merging user-authored rules with page numbers read from designated
//! regions, and converts bounding boxes between extraction and rendering
//! coordinates.
//!
//! # Modules
//!
//! - [`numeral`]: arabic, roman and arbitrary labels
//! - [`page_config`]: which pages a region applies to
//! - [`coords`]: coordinate conversion and box overlap
//! - [`extract`]: region-derived page number extraction and its cache
//! - [`canonical`]: per-page merge and display segments
//! - [`config`]: configuration file
//! - [`snapshot`]: project snapshot files
//! - [`cli`]: command-line definition
//!
//! # Example
//!
//! ```rust
//! use canonical_pages::{CanonicalPageComputer, CanonicalPageRule, NumeralType, SegmentFormatter};
//!
//! let rules = vec![
//!     CanonicalPageRule::positive("front", 1, 4, NumeralType::Roman, "i"),
//!     CanonicalPageRule::positive("body", 5, 9, NumeralType::Arabic, "1"),
//! ];
//! let map = CanonicalPageComputer::compute(9, &[], &rules, &[]);
//! let segments = SegmentFormatter::format(&map, &rules, &[]);
//! assert_eq!(SegmentFormatter::display(&segments), "i-iv 🔵  1-5 🔵");
//! ```

pub mod canonical;
pub mod cli;
pub mod config;
pub mod coords;
pub mod extract;
pub mod numeral;
pub mod page_config;
pub mod snapshot;

pub use canonical::{
    CanonicalPageComputer, CanonicalPageInfo, CanonicalPageMap, CanonicalPageRule,
    CanonicalPageSegment, CanonicalPageStatistics, MapStatus, PageColor, PageNumberConflict,
    PageSource, PageSpan, RuleError, RuleType, SegmentFormatter,
};
pub use cli::{exit_codes, Cli, Commands, ComputeArgs, ConvertBboxArgs, OverlapArgs, SnapshotArgs};
pub use config::{CliOverrides, ConfigError, EngineConfig};
pub use coords::{
    overlap_ratio, overlaps, to_extraction_coords, to_render_coords, Bounds, CoordError,
    CoordinateTransformer, ExtractionBox, RenderBox, Rotation,
};
pub use extract::{
    CancelToken, DerivationCache, DerivationInput, DerivationSupervisor, ExtractError,
    ExtractionOptions, ExtractionOutcome, ExtractionTask, FragmentTextSource, JsonFileStore,
    KeyValueStore, MemoryStore, PageNumberExtractor, RegionDerivedPageNumber, StoreError,
    TextFragment, TextSource, TextSourceError,
};
pub use numeral::NumeralType;
pub use page_config::{ApplicablePagesResolver, PageConfigMode, PageRangeError, Region, RegionType};
pub use snapshot::{ProjectSnapshot, SnapshotError};
