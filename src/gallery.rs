//! Gallery organization.
//!
//! Turns the scanner's buckets into one ordered gallery sequence:
//! uncategorized photos first, then each category in order, each internally
//! sorted by filename. Every photo keeps its category.
//!
//! In filtered mode the organization also carries the category list used
//! for filter buttons. A gallery with fewer than two categories has nothing
//! to filter, so it is always merged regardless of what the listing asks.

use crate::listing::GalleryMode;
use crate::naming::category_label;
use crate::scan::{PhotoCatalog, ScannedCategory};
use crate::types::PhotoAsset;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// A filter category: folder name plus its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Folder name, used as the filter key.
    pub key: String,
    pub label: String,
}

impl Category {
    pub fn from_folder(folder: &str) -> Self {
        Self {
            key: folder.to_string(),
            label: category_label(folder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryOrganization {
    pub mode: GalleryMode,
    /// Filter categories in display order. Empty in merged mode.
    pub categories: Vec<Category>,
    pub items: Vec<PhotoAsset>,
    #[serde(skip)]
    requested: GalleryMode,
}

/// Organize scanned photos into the gallery sequence.
///
/// `category_order` moves the named folders to the front, in the order
/// given; remaining folders follow in discovery order. Unknown names are
/// ignored.
pub fn organize(
    catalog: &PhotoCatalog,
    requested: GalleryMode,
    category_order: &[String],
) -> GalleryOrganization {
    let ordered = order_categories(&catalog.categories, category_order);
    let items = catalog
        .uncategorized
        .iter()
        .chain(ordered.iter().flat_map(|c| c.photos.iter()))
        .cloned()
        .collect();
    from_items(items, requested)
}

impl GalleryOrganization {
    /// The mode the listing asked for, before the fewer-than-two rule.
    pub fn requested_mode(&self) -> GalleryMode {
        self.requested
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&PhotoAsset> {
        self.items.first()
    }

    /// Re-derive the organization keeping only photos for which `keep`
    /// holds, preserving order.
    ///
    /// Categories left without photos disappear, and the fewer-than-two
    /// rule is applied again against what remains.
    pub fn retain_surviving(&self, keep: impl Fn(&PhotoAsset) -> bool) -> GalleryOrganization {
        let items = self.items.iter().filter(|p| keep(p)).cloned().collect();
        from_items(items, self.requested)
    }
}

fn from_items(items: Vec<PhotoAsset>, requested: GalleryMode) -> GalleryOrganization {
    let items: Vec<PhotoAsset> = items
        .into_iter()
        .enumerate()
        .map(|(order, p)| PhotoAsset { order, ..p })
        .collect();

    let mut seen = BTreeSet::new();
    let categories: Vec<Category> = items
        .iter()
        .filter_map(|p| p.category.as_deref())
        .filter(|c| seen.insert(*c))
        .map(Category::from_folder)
        .collect();

    let mode = match requested {
        GalleryMode::Filtered if categories.len() >= 2 => GalleryMode::Filtered,
        GalleryMode::Filtered => {
            debug!(
                categories = categories.len(),
                "fewer than two categories, using merged gallery"
            );
            GalleryMode::Merged
        }
        GalleryMode::Merged => GalleryMode::Merged,
    };

    GalleryOrganization {
        mode,
        categories: match mode {
            GalleryMode::Filtered => categories,
            GalleryMode::Merged => Vec::new(),
        },
        items,
        requested,
    }
}

fn order_categories<'a>(
    categories: &'a [ScannedCategory],
    preferred: &[String],
) -> Vec<&'a ScannedCategory> {
    let mut ordered: Vec<&ScannedCategory> = Vec::with_capacity(categories.len());
    for name in preferred {
        if let Some(c) = categories.iter().find(|c| &c.name == name)
            && !ordered.iter().any(|o| o.name == c.name)
        {
            ordered.push(c);
        }
    }
    for c in categories {
        if !ordered.iter().any(|o| o.name == c.name) {
            ordered.push(c);
        }
    }
    ordered
}
