//! The listing model handed to the renderer.
//!
//! [`build_model`] is a pure aggregation: it reads the validated listing,
//! the final gallery, the hero and agent selections, and the optimized
//! images, and fills in documented fallbacks. Optional sections serialize
//! as explicit `null` so templates can test for them uniformly.

use crate::gallery::GalleryOrganization;
use crate::hero::{AgentPhoto, HeroSelection};
use crate::listing::{Agent, Details, GalleryMode, HeroStyle, Listing, ThemeScheme};
use crate::process::OptimizedImage;
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the serialized model in the output directory.
pub const MODEL_FILENAME: &str = "listing-model.json";

/// One gallery photo with its optimized files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryItem {
    pub source_path: String,
    pub category: Option<String>,
    pub filename: String,
    pub order: usize,
    pub image: String,
    pub thumbnail: String,
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryModel {
    pub mode: GalleryMode,
    pub categories: Vec<crate::gallery::Category>,
    pub items: Vec<GalleryItem>,
}

/// Immutable aggregate describing one built listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingModel {
    pub title: String,
    pub address: String,
    pub details: Details,
    /// `"$1,234,567"` when the price is positive.
    pub price_formatted: Option<String>,
    pub agent: Option<Agent>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: Vec<String>,
    pub theme_scheme: ThemeScheme,
    pub hero_style: HeroStyle,
    pub hero: HeroSelection,
    /// Output path of the hero image.
    pub hero_image: Option<String>,
    pub agent_photo: AgentPhoto,
    /// Output path of the agent photo.
    pub agent_photo_path: Option<String>,
    pub gallery: GalleryModel,
    pub matterport_url: Option<String>,
    pub video_url: Option<String>,
    pub aerials: Option<Vec<String>>,
    pub floorplan: Option<Vec<String>>,
    /// Every optimized image, keyed by source path.
    pub images: BTreeMap<String, OptimizedImage>,
}

/// Everything the model is built from.
#[derive(Debug, Clone)]
pub struct ModelInputs<'a> {
    pub listing: &'a Listing,
    pub gallery: &'a GalleryOrganization,
    pub hero: HeroSelection,
    pub agent: AgentPhoto,
    pub images: BTreeMap<String, OptimizedImage>,
    /// Pass-through files found on disk.
    pub aerials: Vec<String>,
    pub floorplan: Vec<String>,
}

pub fn build_model(inputs: ModelInputs<'_>) -> ListingModel {
    let ModelInputs {
        listing,
        gallery,
        hero,
        agent,
        images,
        aerials,
        floorplan,
    } = inputs;

    let items = gallery
        .items
        .iter()
        .filter_map(|photo| {
            let image = images.get(&photo.source_path)?;
            Some(GalleryItem {
                source_path: photo.source_path.clone(),
                category: photo.category.clone(),
                filename: photo.filename.clone(),
                order: photo.order,
                image: image.main_output_path.clone(),
                thumbnail: image.thumb_output_path.clone(),
                width: image.width,
                height: image.height,
                thumb_width: image.thumb_width,
                thumb_height: image.thumb_height,
            })
        })
        .collect();

    let output_of = |source: &Option<String>| {
        source
            .as_ref()
            .and_then(|s| images.get(s))
            .map(|i| i.main_output_path.clone())
    };
    let hero_image = output_of(&hero.source_path);
    let agent_photo_path = output_of(&agent.source_path);

    ListingModel {
        title: listing.title.clone(),
        address: listing.address.clone(),
        details: listing.details.clone(),
        price_formatted: format_price(listing.details.price),
        agent: listing.agent.clone(),
        seo_title: listing
            .seo
            .title
            .clone()
            .unwrap_or_else(|| listing.title.clone()),
        seo_description: listing
            .seo
            .description
            .clone()
            .unwrap_or_else(|| format!("Real estate listing at {}", listing.address)),
        seo_keywords: listing.seo.keywords.clone(),
        theme_scheme: listing.theme_scheme.unwrap_or_default(),
        hero_style: listing.hero_style.unwrap_or_default(),
        hero,
        hero_image,
        agent_photo: agent,
        agent_photo_path,
        gallery: GalleryModel {
            mode: gallery.mode,
            categories: gallery.categories.clone(),
            items,
        },
        matterport_url: listing.media.matterport_url.clone(),
        video_url: listing.media.video_url.clone(),
        aerials: section(listing.media.has_aerials, aerials),
        floorplan: section(listing.media.has_floorplan, floorplan),
        images,
    }
}

fn section(enabled: bool, files: Vec<String>) -> Option<Vec<String>> {
    (enabled && !files.is_empty()).then_some(files)
}

/// Format a price as whole dollars with thousands separators.
///
/// Zero or negative prices have no display form. Cents are kept only when
/// present.
pub fn format_price(price: f64) -> Option<String> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let cents = (price * 100.0).round() as u64;
    let (dollars, rest) = (cents / 100, cents % 100);

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rest == 0 {
        Some(format!("${grouped}"))
    } else {
        Some(format!("${grouped}.{rest:02}"))
    }
}
