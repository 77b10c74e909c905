//! Project snapshot files
//!
//! A JSON export of everything one computation needs: regions, rules, and
//! either pre-computed readings or the page text fragments to extract from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::CanonicalPageRule;
use crate::extract::{FragmentTextSource, RegionDerivedPageNumber, TextFragment};
use crate::page_config::Region;

/// Snapshot error types
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// One project's rules, regions and page data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project_id: String,
    pub document_page_count: u32,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub rules: Vec<CanonicalPageRule>,
    /// Readings produced elsewhere, merged with any extracted ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<RegionDerivedPageNumber>,
    /// Text fragments per document page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<HashMap<u32, Vec<TextFragment>>>,
}

impl ProjectSnapshot {
    /// Read a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SnapshotError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Text source over the snapshot's fragments, if it has any
    pub fn text_source(&self) -> Option<FragmentTextSource> {
        self.fragments
            .as_ref()
            .map(|pages| FragmentTextSource::from_pages(self.document_page_count, pages.clone()))
    }
}
