//! Extraction module core types
//!
//! Readings, options, errors and the extraction outcome.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numeral::NumeralType;

// ============================================================
// Constants
// ============================================================

/// Default number of text-access calls in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound on concurrent text-access calls
pub const MAX_CONCURRENCY: usize = 64;

/// Default timeout for one text-access call (milliseconds)
pub const DEFAULT_TEXT_TIMEOUT_MS: u64 = 5_000;

// ============================================================
// Error Types
// ============================================================

/// Text-access capability error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextSourceError {
    #[error("Document unavailable: {0}")]
    DocumentUnavailable(String),

    #[error("Page {page} unavailable: {message}")]
    PageUnavailable { page: u32, message: String },
}

/// Extraction error types.
///
/// Only whole-document failures surface here; per-page problems degrade to
/// "no reading" for that page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot open document: {0}")]
    DocumentUnavailable(#[source] TextSourceError),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

// ============================================================
// Core Data Structures
// ============================================================

/// One page-number reading for one document page from one region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDerivedPageNumber {
    pub document_page: u32,
    pub canonical_page: String,
    pub region_id: String,
    pub region_name: String,
}

impl RegionDerivedPageNumber {
    pub fn new(
        document_page: u32,
        canonical_page: impl Into<String>,
        region_id: impl Into<String>,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            document_page,
            canonical_page: canonical_page.into(),
            region_id: region_id.into(),
            region_name: region_name.into(),
        }
    }
}

/// A canonical page label parsed from raw page text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken {
    pub value: String,
    pub numeral_type: NumeralType,
}

/// Result of an extraction run that was allowed to finish or was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// All steps ran; readings in region order, then page order
    Completed(Vec<RegionDerivedPageNumber>),
    /// Inputs changed mid-flight; nothing was published
    Cancelled,
}

impl ExtractionOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExtractionOutcome::Cancelled)
    }

    /// Readings of a completed run
    pub fn readings(&self) -> Option<&[RegionDerivedPageNumber]> {
        match self {
            ExtractionOutcome::Completed(readings) => Some(readings),
            ExtractionOutcome::Cancelled => None,
        }
    }

    pub fn into_readings(self) -> Option<Vec<RegionDerivedPageNumber>> {
        match self {
            ExtractionOutcome::Completed(readings) => Some(readings),
            ExtractionOutcome::Cancelled => None,
        }
    }
}

// ============================================================
// Options
// ============================================================

/// Extraction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Maximum text-access calls in flight
    pub concurrency: usize,
    /// Per-call timeout; `None` waits indefinitely
    pub text_timeout: Option<Duration>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            text_timeout: Some(Duration::from_millis(DEFAULT_TEXT_TIMEOUT_MS)),
        }
    }
}

impl ExtractionOptions {
    /// Create a new options builder
    pub fn builder() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::default()
    }

    /// One call at a time, like a single-threaded viewer
    pub fn sequential() -> Self {
        Self {
            concurrency: 1,
            ..Default::default()
        }
    }
}

/// Builder for ExtractionOptions
#[derive(Debug, Default)]
pub struct ExtractionOptionsBuilder {
    options: ExtractionOptions,
}

impl ExtractionOptionsBuilder {
    /// Set concurrency (clamped to 1-64)
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn text_timeout(mut self, timeout: Duration) -> Self {
        self.options.text_timeout = Some(timeout);
        self
    }

    /// Disable the per-call timeout
    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.options.text_timeout = None;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ExtractionOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_options_default() {
        let opts = ExtractionOptions::default();
        assert_eq!(opts.concurrency, 4);
        assert_eq!(opts.text_timeout, Some(Duration::from_millis(5_000)));
        assert_eq!(ExtractionOptions::sequential().concurrency, 1);
    }

    #[test]
    fn test_builder_clamping() {
        let opts = ExtractionOptions::builder().concurrency(0).build();
        assert_eq!(opts.concurrency, 1);

        let opts = ExtractionOptions::builder().concurrency(1000).build();
        assert_eq!(opts.concurrency, 64);

        let opts = ExtractionOptions::builder()
            .concurrency(8)
            .text_timeout(Duration::from_millis(250))
            .build();
        assert_eq!(opts.concurrency, 8);
        assert_eq!(opts.text_timeout, Some(Duration::from_millis(250)));

        let opts = ExtractionOptions::builder().no_timeout().build();
        assert_eq!(opts.text_timeout, None);
    }

    #[test]
    fn test_reading_serde_camel_case() {
        let reading = RegionDerivedPageNumber::new(3, "iii", "r1", "Footer");
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            json,
            r#"{"documentPage":3,"canonicalPage":"iii","regionId":"r1","regionName":"Footer"}"#
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let done = ExtractionOutcome::Completed(vec![RegionDerivedPageNumber::new(
            1, "1", "r", "R",
        )]);
        assert!(!done.is_cancelled());
        assert_eq!(done.readings().map(<[_]>::len), Some(1));
        assert!(ExtractionOutcome::Cancelled.is_cancelled());
        assert_eq!(ExtractionOutcome::Cancelled.into_readings(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ExtractError::DocumentUnavailable(TextSourceError::DocumentUnavailable(
            "missing.pdf".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Cannot open document: Document unavailable: missing.pdf"
        );
    }
}
