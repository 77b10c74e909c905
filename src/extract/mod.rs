//! Region-derived page number extraction
//!
//! Reads the text under every page-number region on every page the region
//! applies to, and turns it into canonical page readings.
//!
//! # Features
//!
//! - Pluggable text access ([`TextSource`])
//! - Bounded parallel text-access calls with per-call timeouts
//! - Cancellation that never publishes partial results
//! - Content-addressed derivation cache over any key-value store
//!
//! # Example
//!
//! ```rust,no_run
//! use canonical_pages::coords::ExtractionBox;
//! use canonical_pages::extract::{
//!     CancelToken, FragmentTextSource, PageNumberExtractor, TextFragment,
//! };
//! use canonical_pages::page_config::Region;
//!
//! # async fn run() -> canonical_pages::extract::Result<()> {
//! let source = FragmentTextSource::new(1)
//!     .with_fragment(1, TextFragment::new("iv", 300.0, 25.0, 10.0, 8.0));
//! let regions = vec![Region::page_number(
//!     "footer",
//!     "Footer",
//!     ExtractionBox::new(280.0, 20.0, 330.0, 40.0),
//! )];
//!
//! let outcome = PageNumberExtractor::default()
//!     .extract(&regions, 1, &source, &CancelToken::new())
//!     .await?;
//! assert_eq!(outcome.readings().map(|r| r.len()), Some(1));
//! # Ok(())
//! # }
//! ```

mod cache;
mod cancel;
mod extractor;
mod parse;
mod source;
mod types;

pub use cache::{
    CachedPageNumbers, DerivationCache, JsonFileStore, KeyValueStore, MemoryStore, StoreError,
    STORAGE_KEY_PREFIX,
};
pub use cancel::CancelToken;
pub use extractor::{DerivationInput, DerivationSupervisor, ExtractionTask, PageNumberExtractor};
pub use parse::parse_page_token;
pub use source::{FragmentTextSource, TextFragment, TextSource, DEFAULT_FRAGMENT_HEIGHT};
pub use types::{
    ExtractError, ExtractionOptions, ExtractionOptionsBuilder, ExtractionOutcome, PageToken,
    RegionDerivedPageNumber, Result, TextSourceError, DEFAULT_CONCURRENCY,
    DEFAULT_TEXT_TIMEOUT_MS, MAX_CONCURRENCY,
};
