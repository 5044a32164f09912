//! Shared test utilities for the tour-gen test suite.
//!
//! Builders for listing documents and photo assets, plus on-disk fixture
//! helpers for tests that walk a real listing root.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_listing(tmp.path(), json!({ "gallery": { "organization": "filtered" } }));
//! touch(tmp.path(), "photos/exterior/a.jpg");
//!
//! let asset = photo(Some("exterior"), "a.jpg");
//! assert_eq!(asset.source_path, "photos/exterior/a.jpg");
//! ```

use std::fs;
use std::path::Path;

use crate::listing::{LISTING_FILENAME, Listing};
use crate::types::PhotoAsset;
use serde_json::{Value, json};

// =========================================================================
// Listing documents
// =========================================================================

/// A minimal valid listing document with `extra` top-level keys merged in.
pub fn listing_value(extra: Value) -> Value {
    let mut value = json!({
        "title": "Harbor Loft",
        "address": "4 Dock St",
        "details": { "price": 850000, "beds": 2, "baths": 2, "sqft": 1400 }
    });
    if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    value
}

/// Parsed form of [`listing_value`].
pub fn listing(extra: Value) -> Listing {
    Listing::from_value(listing_value(extra)).unwrap()
}

/// Write `listing.json` into a listing root.
pub fn write_listing(root: &Path, extra: Value) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join(LISTING_FILENAME), listing_value(extra).to_string()).unwrap();
}

// =========================================================================
// Photos
// =========================================================================

/// A gallery asset under `photos/`, optionally inside a category folder.
pub fn photo(category: Option<&str>, filename: &str) -> PhotoAsset {
    let source_path = match category {
        Some(c) => format!("photos/{c}/{filename}"),
        None => format!("photos/{filename}"),
    };
    PhotoAsset {
        source_path,
        category: category.map(str::to_string),
        filename: filename.to_string(),
        order: 0,
    }
}

/// Create a file at `rel` under `root`, parents included.
///
/// The content is the relative path itself, so distinct files hash
/// differently.
pub fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, rel).unwrap();
}
