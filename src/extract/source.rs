//! Text-access capability
//!
//! The viewer owns the document; extraction only asks it for the text
//! under a box on a page.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::TextSourceError;
use crate::coords::ExtractionBox;

/// Height assumed for fragments that report none (points)
pub const DEFAULT_FRAGMENT_HEIGHT: f64 = 12.0;

/// Access to page text by location
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Make sure the document can be read at all.
    ///
    /// Failure here aborts extraction; per-page failures in [`text_at`](Self::text_at) do not.
    async fn open(&self) -> Result<(), TextSourceError> {
        Ok(())
    }

    /// Concatenated text of every fragment intersecting `bbox` on `page`
    async fn text_at(&self, page: u32, bbox: &ExtractionBox) -> Result<String, TextSourceError>;
}

/// A positioned run of text, in extraction coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// `[x, x+width] × [y, y+height]` strictly intersects the query box
    pub fn intersects(&self, bbox: &ExtractionBox) -> bool {
        let width = self.width.max(0.0);
        let height = if self.height > 0.0 {
            self.height
        } else {
            DEFAULT_FRAGMENT_HEIGHT
        };

        self.x < bbox.x1 && self.x + width > bbox.x0 && self.y < bbox.y1 && self.y + height > bbox.y0
    }
}

/// In-memory text source over pre-extracted fragments
#[derive(Debug, Clone, Default)]
pub struct FragmentTextSource {
    page_count: u32,
    pages: HashMap<u32, Vec<TextFragment>>,
}

impl FragmentTextSource {
    /// Create an empty source for a document of `page_count` pages
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            pages: HashMap::new(),
        }
    }

    /// Create a source from fragments grouped by page
    pub fn from_pages(page_count: u32, pages: HashMap<u32, Vec<TextFragment>>) -> Self {
        Self { page_count, pages }
    }

    /// Add a fragment to a page
    pub fn push(&mut self, page: u32, fragment: TextFragment) {
        self.pages.entry(page).or_default().push(fragment);
    }

    /// Add a fragment to a page, builder style
    #[must_use]
    pub fn with_fragment(mut self, page: u32, fragment: TextFragment) -> Self {
        self.push(page, fragment);
        self
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }
}

#[async_trait]
impl TextSource for FragmentTextSource {
    async fn text_at(&self, page: u32, bbox: &ExtractionBox) -> Result<String, TextSourceError> {
        if page == 0 || page > self.page_count {
            return Err(TextSourceError::PageUnavailable {
                page,
                message: format!("document has {} pages", self.page_count),
            });
        }

        let texts: Vec<&str> = self
            .pages
            .get(&page)
            .into_iter()
            .flatten()
            .filter(|fragment| !fragment.text.is_empty() && fragment.intersects(bbox))
            .map(|fragment| fragment.text.as_str())
            .collect();

        Ok(texts.join(" ").trim().to_string())
    }
}
