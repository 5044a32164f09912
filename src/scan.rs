//! Photo discovery.
//!
//! First stage of the listing build. Walks the listing root, finds gallery
//! candidates, the reserved hero and agent files, and pass-through media.
//!
//! ## Directory Structure
//!
//! ```text
//! listing/                       # Listing root
//! ├── listing.json
//! ├── config.toml                # Build settings (optional)
//! ├── hero.jpg                   # Explicit hero (reserved name)
//! ├── agent.jpg                  # Agent portrait (reserved name)
//! ├── aerials/                   # Copied verbatim, never a category
//! ├── floorplan/                 # Copied verbatim, never a category
//! └── photos/                    # Photo root (optional)
//!     ├── 01.jpg                 # Uncategorized bucket
//!     ├── exterior/              # Category "exterior"
//!     │   ├── a.jpg
//!     │   └── b.png
//!     └── kitchen/
//!         └── c.webp
//! ```
//!
//! Without a `photos/` directory the listing root itself is the photo root.
//! Only one level of subdirectories is scanned; deeper files are ignored.
//!
//! ## Rules
//!
//! - Candidates are `.jpg`, `.jpeg`, `.png` and `.webp`, case-insensitive.
//! - `hero.jpg` and `agent.jpg` are reserved everywhere: never gallery photos.
//! - Hidden files and folders (leading `.`) are skipped.
//! - Files are ordered by filename, categories by folder name, both byte-wise.
//! - Two files whose output names collide (`a.png` and `a.jpg`) keep the
//!   first in filename order; the other is reported as an [`AssetError`].
//! - Unreadable candidates and subfolders are reported as [`AssetError`]s
//!   and dropped.
//! - A hero or agent file named in `listing.json` but missing is reported,
//!   and the reserved file at the root is used instead.
//!
//! The classification rules live in [`classify`], a pure function over a
//! virtual listing of [`FsEntry`] values, so they are testable without I/O.

use crate::imaging::{ImageBackend, supported_input_extensions};
use crate::listing::Listing;
use crate::naming::jpeg_output_name;
use crate::types::{AssetError, PhotoAsset};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const PHOTOS_DIR: &str = "photos";
pub const AERIALS_DIR: &str = "aerials";
pub const FLOORPLAN_DIR: &str = "floorplan";
pub const HERO_FILENAME: &str = "hero.jpg";
pub const AGENT_FILENAME: &str = "agent.jpg";

const RESERVED_FILENAMES: &[&str] = &[HERO_FILENAME, AGENT_FILENAME];
const PASS_THROUGH_DIRS: &[&str] = &[AERIALS_DIR, FLOORPLAN_DIR];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk listing directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Listing root not found: {0}")]
    MissingRoot(String),
}

/// One entry of a directory listing, relative to the photo root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    /// `/`-separated path relative to the photo root.
    pub path: String,
    pub is_dir: bool,
}

impl FsEntry {
    pub fn file(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_dir: false,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_dir: true,
        }
    }
}

/// Result of classifying a photo-root listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Filenames directly under the photo root, sorted.
    pub root_files: Vec<String>,
    /// `(folder, sorted filenames)` in folder-name order. Only folders with
    /// at least one candidate appear.
    pub categories: Vec<(String, Vec<String>)>,
    /// Relative paths dropped because their output name was already taken.
    pub collisions: Vec<String>,
}

/// Sort a photo-root listing into the uncategorized bucket and categories.
///
/// `flat_root` is true when the photo root is the listing root, in which
/// case the pass-through folders are not categories. `excluded` holds extra
/// photo-root-relative paths to leave out (an explicit hero or agent file).
pub fn classify(entries: &[FsEntry], flat_root: bool, excluded: &[String]) -> Classification {
    let mut root: BTreeSet<&str> = BTreeSet::new();
    let mut folders: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for entry in entries.iter().filter(|e| !e.is_dir) {
        if excluded.iter().any(|x| x == &entry.path) {
            continue;
        }
        let parts: Vec<&str> = entry.path.split('/').collect();
        if parts.iter().any(|p| p.is_empty() || p.starts_with('.')) {
            continue;
        }
        let (folder, filename) = match parts.as_slice() {
            [file] => (None, *file),
            [folder, file] => (Some(*folder), *file),
            _ => continue,
        };
        if flat_root && folder.is_some_and(|f| PASS_THROUGH_DIRS.contains(&f)) {
            continue;
        }
        if !is_candidate(filename) {
            continue;
        }
        match folder {
            Some(folder) => {
                folders.entry(folder).or_default().insert(filename);
            }
            None => {
                root.insert(filename);
            }
        }
    }

    let mut collisions = Vec::new();
    let root_files = dedupe_output_names(None, root, &mut collisions);
    let categories = folders
        .into_iter()
        .map(|(folder, files)| {
            let files = dedupe_output_names(Some(folder), files, &mut collisions);
            (folder.to_string(), files)
        })
        .filter(|(_, files)| !files.is_empty())
        .collect();

    Classification {
        root_files,
        categories,
        collisions,
    }
}

/// Keep the first file per output name, in filename order.
fn dedupe_output_names(
    folder: Option<&str>,
    files: BTreeSet<&str>,
    collisions: &mut Vec<String>,
) -> Vec<String> {
    let mut taken = BTreeSet::new();
    let mut kept = Vec::new();
    for file in files {
        let relative = match folder {
            Some(f) => format!("{f}/{file}"),
            None => file.to_string(),
        };
        if taken.insert(jpeg_output_name(&relative)) {
            kept.push(file.to_string());
        } else {
            collisions.push(relative);
        }
    }
    kept
}

/// True for a gallery candidate filename: supported extension, not reserved.
pub fn is_candidate(filename: &str) -> bool {
    if filename.starts_with('.') || is_reserved(filename) {
        return false;
    }
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

fn is_reserved(filename: &str) -> bool {
    RESERVED_FILENAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(filename))
}

/// Everything the scanner found under a listing root.
///
/// All paths are relative to the listing root and `/`-separated.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PhotoCatalog {
    /// `"photos"` when a photo directory exists, `""` when the listing root
    /// is the photo root.
    pub photo_root: String,
    pub uncategorized: Vec<PhotoAsset>,
    pub categories: Vec<ScannedCategory>,
    /// Explicit hero file, if one exists and is readable.
    pub hero: Option<String>,
    /// Agent portrait, if one exists and is readable.
    pub agent: Option<String>,
    pub aerials: Vec<String>,
    pub floorplan: Vec<String>,
    pub warnings: Vec<AssetError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedCategory {
    pub name: String,
    pub photos: Vec<PhotoAsset>,
}

impl PhotoCatalog {
    /// All gallery candidates, uncategorized first, then by category.
    pub fn photos(&self) -> impl Iterator<Item = &PhotoAsset> {
        self.uncategorized
            .iter()
            .chain(self.categories.iter().flat_map(|c| c.photos.iter()))
    }

    pub fn photo_count(&self) -> usize {
        self.photos().count()
    }
}

/// Scan a listing root, identifying every candidate with `backend`.
pub fn scan_with_backend(
    listing_root: &Path,
    listing: &Listing,
    backend: &impl ImageBackend,
) -> Result<PhotoCatalog, ScanError> {
    if !listing_root.is_dir() {
        return Err(ScanError::MissingRoot(listing_root.display().to_string()));
    }

    let mut warnings = Vec::new();
    let hero = locate_reserved(
        listing_root,
        listing.hero_image.as_deref(),
        HERO_FILENAME,
        backend,
        &mut warnings,
    )?;
    let agent = locate_reserved(
        listing_root,
        listing.agent_photo(),
        AGENT_FILENAME,
        backend,
        &mut warnings,
    )?;

    let photos_dir = listing_root.join(PHOTOS_DIR);
    let (photo_root, flat_root) = if photos_dir.is_dir() {
        (PHOTOS_DIR.to_string(), false)
    } else {
        (String::new(), true)
    };
    let prefix = if flat_root {
        String::new()
    } else {
        format!("{photo_root}/")
    };

    let entries = list_entries(listing_root, &photo_root, 2, &mut warnings)?;
    // An explicitly named hero or agent inside the photo root is not a photo.
    let excluded: Vec<String> = [&hero, &agent]
        .into_iter()
        .flatten()
        .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
        .collect();
    let classification = classify(&entries, flat_root, &excluded);

    for relative in &classification.collisions {
        let source = format!("{prefix}{relative}");
        warn!(path = %source, "output name collides with an earlier photo");
        warnings.push(AssetError::new(
            &source,
            format!(
                "output name {} is already taken by another photo",
                jpeg_output_name(relative)
            ),
        ));
    }

    let mut identify = |category: Option<&str>, filename: &str| -> Option<PhotoAsset> {
        let source_path = match category {
            Some(c) => format!("{prefix}{c}/{filename}"),
            None => format!("{prefix}{filename}"),
        };
        match backend.identify(&listing_root.join(&source_path)) {
            Ok(dims) => {
                debug!(path = %source_path, width = dims.width, height = dims.height, "found photo");
                Some(PhotoAsset {
                    source_path,
                    category: category.map(str::to_string),
                    filename: filename.to_string(),
                    order: 0,
                })
            }
            Err(e) => {
                warn!(path = %source_path, error = %e, "skipping unreadable photo");
                warnings.push(AssetError::new(&source_path, e.to_string()));
                None
            }
        }
    };

    let uncategorized: Vec<PhotoAsset> = classification
        .root_files
        .iter()
        .filter_map(|f| identify(None, f.as_str()))
        .collect();
    let categories: Vec<ScannedCategory> = classification
        .categories
        .iter()
        .map(|(name, files)| ScannedCategory {
            name: name.clone(),
            photos: files
                .iter()
                .filter_map(|f| identify(Some(name.as_str()), f.as_str()))
                .collect(),
        })
        .filter(|c| !c.photos.is_empty())
        .collect();

    let catalog = PhotoCatalog {
        photo_root,
        uncategorized: number(uncategorized),
        categories: categories
            .into_iter()
            .map(|c| ScannedCategory {
                photos: number(c.photos),
                ..c
            })
            .collect(),
        hero,
        agent,
        aerials: list_pass_through(listing_root, AERIALS_DIR, &mut warnings)?,
        floorplan: list_pass_through(listing_root, FLOORPLAN_DIR, &mut warnings)?,
        warnings,
    };
    debug!(
        photos = catalog.photo_count(),
        categories = catalog.categories.len(),
        "scan complete"
    );
    Ok(catalog)
}

/// Position within a bucket; the organizer assigns final gallery order.
fn number(photos: Vec<PhotoAsset>) -> Vec<PhotoAsset> {
    photos
        .into_iter()
        .enumerate()
        .map(|(order, p)| PhotoAsset { order, ..p })
        .collect()
}

/// List non-hidden entries under `listing_root/folder` up to `max_depth`, as
/// [`FsEntry`]s. A subfolder that cannot be read becomes a warning; only an
/// unreadable `folder` itself is an error.
fn list_entries(
    listing_root: &Path,
    folder: &str,
    max_depth: usize,
    warnings: &mut Vec<AssetError>,
) -> Result<Vec<FsEntry>, ScanError> {
    let dir = listing_root.join(folder);
    let mut entries = Vec::new();
    let walker = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| p.strip_prefix(listing_root).ok())
                    .map_or_else(|| PathBuf::from(folder), Path::to_path_buf);
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                warnings.push(AssetError::new(path, e.to_string()));
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(&dir) else {
            continue;
        };
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(FsEntry {
            path,
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

/// Find the hero or agent file: an explicitly named path, else the reserved
/// filename at the listing root (any case). A named file that is missing is
/// a warning and the reserved file is used instead.
fn locate_reserved(
    listing_root: &Path,
    explicit: Option<&str>,
    reserved: &str,
    backend: &impl ImageBackend,
    warnings: &mut Vec<AssetError>,
) -> Result<Option<String>, ScanError> {
    let named = explicit.map(|name| name.trim_start_matches("./").to_string());
    let found = match named {
        Some(name) if listing_root.join(&name).is_file() => Some(name),
        Some(name) => {
            warn!(path = %name, "named file does not exist");
            warnings.push(AssetError::new(&name, "file named in listing.json not found"));
            find_reserved(listing_root, reserved)?
        }
        None => find_reserved(listing_root, reserved)?,
    };

    let Some(name) = found else {
        return Ok(None);
    };
    match backend.identify(&listing_root.join(&name)) {
        Ok(_) => Ok(Some(name)),
        Err(e) => {
            warn!(path = %name, error = %e, "skipping unreadable image");
            warnings.push(AssetError::new(&name, e.to_string()));
            Ok(None)
        }
    }
}

/// The reserved filename at the listing root, matched case-insensitively.
fn find_reserved(listing_root: &Path, reserved: &str) -> std::io::Result<Option<String>> {
    Ok(std::fs::read_dir(listing_root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.eq_ignore_ascii_case(reserved))
        .min())
}

/// Files in a pass-through folder at the listing root, sorted.
fn list_pass_through(
    listing_root: &Path,
    folder: &str,
    warnings: &mut Vec<AssetError>,
) -> Result<Vec<String>, ScanError> {
    if !listing_root.join(folder).is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_entries(listing_root, folder, 1, warnings)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| format!("{folder}/{}", e.path))
        .collect())
}
