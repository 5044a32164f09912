//! Shared types used across all pipeline stages.
//!
//! These are produced by the scanner and read (never mutated) by the
//! organizer, resolver, optimizer and model builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A gallery candidate discovered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAsset {
    /// Path relative to the listing root, `/`-separated (e.g. `photos/exterior/a.jpg`).
    pub source_path: String,
    /// Immediate subfolder the file was found in; `None` for root-level files.
    pub category: Option<String>,
    pub filename: String,
    /// Zero-based position in the final gallery order.
    pub order: usize,
}

impl PhotoAsset {
    /// Path of this asset relative to the photo root, used to derive output names.
    pub fn relative_name(&self) -> String {
        match &self.category {
            Some(category) => format!("{}/{}", category, self.filename),
            None => self.filename.clone(),
        }
    }
}

/// A single photo, hero or agent file that could not be used.
///
/// Asset errors never abort a build. They are collected into the build's
/// warning list and the offending file is left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetError {
    pub path: PathBuf,
    pub reason: String,
}

impl AssetError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

impl std::error::Error for AssetError {}
