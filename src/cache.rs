//! Encode cache for incremental builds.
//!
//! JPEG encoding dominates build time. A rebuild of an unchanged listing
//! should not decode and re-encode every photo, so each published output
//! directory carries a manifest describing how its files were produced.
//! The next build consults it and copies matching files out of the previous
//! output into the new staging directory instead of re-encoding.
//!
//! ## Cache keys
//!
//! Lookups are content-addressed by `source_hash` + `params_hash`, not by
//! output path, so renaming a category folder does not bust the cache.
//!
//! - **`source_hash`**: SHA-256 of the source file bytes.
//! - **`params_hash`**: SHA-256 of everything that shapes the output
//!   (max width, qualities, thumbnail box).
//!
//! A hit also requires both previously written files to still exist.
//!
//! ## Storage
//!
//! `<output>/.build-cache.json`. It is written into staging with the rest of
//! the build and published with it. `--no-cache` starts from an empty
//! manifest.

use crate::imaging::{OptimizeConfig, OptimizedOutput};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = ".build-cache.json";

/// Bump to invalidate every existing cache when the format or keys change.
const MANIFEST_VERSION: u32 = 1;

/// How one main image and its thumbnail were produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
    pub thumb_path: String,
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
}

impl CacheEntry {
    pub fn output(&self) -> OptimizedOutput {
        OptimizedOutput {
            width: self.width,
            height: self.height,
            thumb_width: self.thumb_width,
            thumb_height: self.thumb_height,
        }
    }
}

/// A cache hit: where the files live in the previous output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedOutput {
    pub main_path: String,
    pub entry: CacheEntry,
}

/// On-disk manifest keyed by main output path (relative to the output dir).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → main output path. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from an output directory. Missing, corrupt, or outdated
    /// manifests load as empty.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = manifest
            .entries
            .iter()
            .map(|(main, e)| (content_key(&e.source_hash, &e.params_hash), main.clone()))
            .collect();
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_dir.join(MANIFEST_FILENAME), json)
    }

    /// Find a previous output for this content, if both its files are
    /// still present under `output_dir`.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<CachedOutput> {
        let main_path = self
            .content_index
            .get(&content_key(source_hash, params_hash))?;
        let entry = self.entries.get(main_path)?;
        if output_dir.join(main_path).is_file() && output_dir.join(&entry.thumb_path).is_file() {
            Some(CachedOutput {
                main_path: main_path.clone(),
                entry: entry.clone(),
            })
        } else {
            None
        }
    }

    /// Record how `main_path` was produced. Content that moved to a new
    /// path replaces its old entry.
    pub fn insert(&mut self, main_path: String, entry: CacheEntry) {
        let key = content_key(&entry.source_hash, &entry.params_hash);
        if let Some(old) = self.content_index.get(&key)
            && *old != main_path
        {
            self.entries.remove(old.as_str());
        }
        self.content_index.insert(key, main_path.clone());
        self.entries.insert(main_path, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{}:{}", source_hash, params_hash)
}

/// SHA-256 hash of a file's contents, as hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// SHA-256 hash of the optimizer settings.
pub fn hash_optimize_params(config: &OptimizeConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"optimize\0progressive\0");
    hasher.update(config.max_width.to_le_bytes());
    hasher.update(config.quality.value().to_le_bytes());
    hasher.update(config.thumb_box.0.to_le_bytes());
    hasher.update(config.thumb_box.1.to_le_bytes());
    hasher.update(config.thumb_quality.value().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache performance for one build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub reused: u32,
    pub encoded: u32,
}

impl CacheStats {
    pub fn reuse(&mut self) {
        self.reused += 1;
    }

    pub fn encode(&mut self) {
        self.encoded += 1;
    }

    pub fn total(&self) -> u32 {
        self.reused + self.encoded
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reused > 0 {
            write!(
                f,
                "{} reused, {} encoded ({} total)",
                self.reused,
                self.encoded,
                self.total()
            )
        } else {
            write!(f, "{} encoded", self.encoded)
        }
    }
}
