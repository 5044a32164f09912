//! Listing schema: loading and validating `listing.json`.
//!
//! The listing description is produced by an external collaborator (a
//! wizard or a hand-written file). It is parsed once into a typed
//! [`Listing`] and validated up front, so the rest of the pipeline never
//! deals with missing keys or loosely-typed values.
//!
//! ## Schema
//!
//! ```json
//! {
//!   "title": "Modern Farmhouse",                 // required
//!   "address": "12 Elm St, Springfield",         // required
//!   "details": {
//!     "price": 750000, "beds": 4, "baths": 2.5, "sqft": 2600,   // required
//!     "year_built": 1998, "property_type": "Single Family", "mls": "A-123"
//!   },
//!   "agent": { "name": "...", "phone": "...", "email": "...",
//!              "company": "...", "license": "...", "photo": "agent.jpg" },
//!   "seo": { "title": "...", "description": "...", "keywords": ["..."] },
//!   "media": { "matterport_url": "...", "video_url": "...",
//!              "has_aerials": false, "has_floorplan": false },
//!   "theme": { "scheme": "classic-light" },      // classic-light | luxury-dark | modern-light
//!   "hero": { "style": "single", "image": "hero.jpg" },   // single | slider | video
//!   "gallery": { "organization": "merged", "categories": ["exterior"] }  // merged | filtered
//! }
//! ```
//!
//! Two failure classes are kept apart:
//! - [`ListingError::Validation`]: a required field is missing or has the wrong type.
//! - [`ListingError::Config`]: an enumerated choice has an unknown value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Name of the listing description file in the listing root.
pub const LISTING_FILENAME: &str = "listing.json";

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid listing: {0}")]
    Validation(String),
    #[error("invalid choice: {0}")]
    Config(String),
}

// =============================================================================
// Enumerated choices
// =============================================================================

/// Color scheme applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeScheme {
    #[default]
    ClassicLight,
    LuxuryDark,
    ModernLight,
}

/// How the hero section is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeroStyle {
    #[default]
    Single,
    Slider,
    Video,
}

/// Whether the gallery is one flat grid or grouped with filter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GalleryMode {
    #[default]
    Merged,
    Filtered,
}

macro_rules! string_choice {
    ($ty:ty, $field:literal, { $($text:literal => $variant:path),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ListingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(ListingError::Config(format!(
                        "unknown {} '{}' (expected one of: {})",
                        $field,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match *self {
                    $($variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

string_choice!(ThemeScheme, "theme.scheme", {
    "classic-light" => ThemeScheme::ClassicLight,
    "luxury-dark" => ThemeScheme::LuxuryDark,
    "modern-light" => ThemeScheme::ModernLight,
});

string_choice!(HeroStyle, "hero.style", {
    "single" => HeroStyle::Single,
    "slider" => HeroStyle::Slider,
    "video" => HeroStyle::Video,
});

string_choice!(GalleryMode, "gallery.organization", {
    "merged" => GalleryMode::Merged,
    "filtered" => GalleryMode::Filtered,
});

// =============================================================================
// Schema
// =============================================================================

/// Property facts. `price`, `beds`, `baths` and `sqft` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Details {
    pub price: f64,
    pub beds: f64,
    pub baths: f64,
    pub sqft: f64,
    #[serde(default)]
    pub year_built: Option<u32>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub mls: Option<String>,
}

/// Listing agent contact information. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Agent {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub license: Option<String>,
    /// Agent photo filename relative to the listing root. Defaults to `agent.jpg`.
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Media {
    pub matterport_url: Option<String>,
    pub video_url: Option<String>,
    pub has_aerials: bool,
    pub has_floorplan: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawTheme {
    scheme: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawHero {
    style: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawGallery {
    organization: Option<String>,
    categories: Vec<String>,
}

/// `listing.json` as written on disk, before enumerated choices are checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawListing {
    title: String,
    address: String,
    details: Details,
    #[serde(default)]
    agent: Option<Agent>,
    #[serde(default)]
    seo: Seo,
    #[serde(default)]
    media: Media,
    #[serde(default)]
    theme: RawTheme,
    #[serde(default)]
    hero: RawHero,
    #[serde(default)]
    gallery: RawGallery,
}

/// A validated listing description.
///
/// Optional choices stay `None` when the file leaves them out; the model
/// builder applies the documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub title: String,
    pub address: String,
    pub details: Details,
    pub agent: Option<Agent>,
    pub seo: Seo,
    pub media: Media,
    pub theme_scheme: Option<ThemeScheme>,
    pub hero_style: Option<HeroStyle>,
    /// Explicit hero image filename relative to the listing root.
    pub hero_image: Option<String>,
    /// Requested gallery organization. Defaults to merged.
    pub gallery_mode: GalleryMode,
    /// Category folder names to show first, in this order.
    pub category_order: Vec<String>,
}

/// Required top-level keys and required `details` keys, checked before
/// deserialization so the diagnosis names the missing field.
const REQUIRED_FIELDS: &[&str] = &["title", "address", "details"];
const REQUIRED_DETAILS: &[&str] = &["price", "beds", "baths", "sqft"];

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_choice<T: FromStr<Err = ListingError>>(
    value: Option<String>,
) -> Result<Option<T>, ListingError> {
    non_empty(value).map(|s| s.parse()).transpose()
}

impl Listing {
    /// Parse and validate a listing from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ListingError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ListingError::Validation(format!("malformed JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ListingError> {
        let object = value
            .as_object()
            .ok_or_else(|| ListingError::Validation("top level must be an object".into()))?;

        for field in REQUIRED_FIELDS {
            if object.get(*field).is_none_or(|v| v.is_null()) {
                return Err(ListingError::Validation(format!(
                    "required field '{field}' is missing"
                )));
            }
        }
        let details = object
            .get("details")
            .and_then(|d| d.as_object())
            .ok_or_else(|| ListingError::Validation("'details' must be an object".into()))?;
        for field in REQUIRED_DETAILS {
            if details.get(*field).is_none_or(|v| v.is_null()) {
                return Err(ListingError::Validation(format!(
                    "required field 'details.{field}' is missing"
                )));
            }
        }

        let raw: RawListing =
            serde_json::from_value(value).map_err(|e| ListingError::Validation(e.to_string()))?;

        if raw.title.trim().is_empty() {
            return Err(ListingError::Validation("'title' must not be empty".into()));
        }
        if raw.address.trim().is_empty() {
            return Err(ListingError::Validation(
                "'address' must not be empty".into(),
            ));
        }
        for (name, number) in [
            ("price", raw.details.price),
            ("beds", raw.details.beds),
            ("baths", raw.details.baths),
            ("sqft", raw.details.sqft),
        ] {
            if !number.is_finite() || number < 0.0 {
                return Err(ListingError::Validation(format!(
                    "'details.{name}' must be a non-negative number"
                )));
            }
        }

        Ok(Self {
            title: raw.title.trim().to_string(),
            address: raw.address.trim().to_string(),
            details: raw.details,
            agent: raw.agent,
            seo: Seo {
                title: non_empty(raw.seo.title),
                description: non_empty(raw.seo.description),
                keywords: raw.seo.keywords,
            },
            media: Media {
                matterport_url: non_empty(raw.media.matterport_url),
                video_url: non_empty(raw.media.video_url),
                ..raw.media
            },
            theme_scheme: parse_choice(raw.theme.scheme)?,
            hero_style: parse_choice(raw.hero.style)?,
            hero_image: non_empty(raw.hero.image),
            gallery_mode: parse_choice(raw.gallery.organization)?.unwrap_or_default(),
            category_order: raw.gallery.categories,
        })
    }

    /// Agent photo filename as named in the listing, if any.
    pub fn agent_photo(&self) -> Option<&str> {
        self.agent
            .as_ref()
            .and_then(|a| a.photo.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Load and validate `listing.json` from a listing root.
pub fn load_listing(listing_root: &Path) -> Result<Listing, ListingError> {
    let path = listing_root.join(LISTING_FILENAME);
    let text = fs::read_to_string(&path).map_err(|source| ListingError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Listing::from_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "title": "Modern Farmhouse",
            "address": "12 Elm St",
            "details": { "price": 750000, "beds": 4, "baths": 2.5, "sqft": 2600 }
        })
    }

    #[test]
    fn minimal_listing_uses_defaults() {
        let listing = Listing::from_value(minimal()).unwrap();
        assert_eq!(listing.title, "Modern Farmhouse");
        assert_eq!(listing.details.baths, 2.5);
        assert_eq!(listing.gallery_mode, GalleryMode::Merged);
        assert_eq!(listing.theme_scheme, None);
        assert_eq!(listing.hero_style, None);
        assert!(listing.agent.is_none());
        assert!(listing.seo.keywords.is_empty());
        assert!(!listing.media.has_aerials);
    }

    #[test]
    fn missing_title_is_validation_error() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("title");
        let err = Listing::from_value(value).unwrap_err();
        assert!(matches!(&err, ListingError::Validation(m) if m.contains("'title'")));
    }

    #[test]
    fn missing_detail_field_names_the_field() {
        let mut value = minimal();
        value["details"].as_object_mut().unwrap().remove("sqft");
        let err = Listing::from_value(value).unwrap_err();
        assert!(matches!(&err, ListingError::Validation(m) if m.contains("details.sqft")));
    }

    #[test]
    fn wrong_type_is_validation_error() {
        let mut value = minimal();
        value["details"]["price"] = json!("a lot");
        assert!(matches!(
            Listing::from_value(value),
            Err(ListingError::Validation(_))
        ));
    }

    #[test]
    fn negative_price_is_validation_error() {
        let mut value = minimal();
        value["details"]["price"] = json!(-1);
        assert!(matches!(
            Listing::from_value(value),
            Err(ListingError::Validation(_))
        ));
    }

    #[test]
    fn unknown_theme_is_config_error() {
        let mut value = minimal();
        value["theme"] = json!({ "scheme": "neon-pink" });
        let err = Listing::from_value(value).unwrap_err();
        assert!(matches!(&err, ListingError::Config(m) if m.contains("neon-pink")));
    }

    #[test]
    fn unknown_hero_style_is_config_error() {
        let mut value = minimal();
        value["hero"] = json!({ "style": "carousel" });
        assert!(matches!(
            Listing::from_value(value),
            Err(ListingError::Config(_))
        ));
    }

    #[test]
    fn unknown_gallery_mode_is_config_error() {
        let mut value = minimal();
        value["gallery"] = json!({ "organization": "grouped" });
        assert!(matches!(
            Listing::from_value(value),
            Err(ListingError::Config(_))
        ));
    }

    #[test]
    fn choices_are_parsed() {
        let mut value = minimal();
        value["theme"] = json!({ "scheme": "luxury-dark" });
        value["hero"] = json!({ "style": "Slider", "image": "front.jpg" });
        value["gallery"] = json!({ "organization": "filtered", "categories": ["interior"] });
        let listing = Listing::from_value(value).unwrap();
        assert_eq!(listing.theme_scheme, Some(ThemeScheme::LuxuryDark));
        assert_eq!(listing.hero_style, Some(HeroStyle::Slider));
        assert_eq!(listing.hero_image.as_deref(), Some("front.jpg"));
        assert_eq!(listing.gallery_mode, GalleryMode::Filtered);
        assert_eq!(listing.category_order, vec!["interior"]);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let mut value = minimal();
        value["seo"] = json!({ "title": "  ", "description": "" });
        value["theme"] = json!({ "scheme": "" });
        let listing = Listing::from_value(value).unwrap();
        assert_eq!(listing.seo.title, None);
        assert_eq!(listing.seo.description, None);
        assert_eq!(listing.theme_scheme, None);
    }

    #[test]
    fn agent_photo_is_read() {
        let mut value = minimal();
        value["agent"] = json!({ "name": "Pat", "photo": "pat.jpg" });
        let listing = Listing::from_value(value).unwrap();
        assert_eq!(listing.agent_photo(), Some("pat.jpg"));
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let mut value = minimal();
        value["titel"] = json!("typo");
        assert!(matches!(
            Listing::from_value(value),
            Err(ListingError::Validation(_))
        ));
    }

    #[test]
    fn choice_display_round_trips() {
        assert_eq!(ThemeScheme::ModernLight.to_string(), "modern-light");
        assert_eq!(HeroStyle::Video.to_string(), "video");
        assert_eq!(GalleryMode::Filtered.to_string(), "filtered");
        assert_eq!(
            "classic-light".parse::<ThemeScheme>().unwrap(),
            ThemeScheme::ClassicLight
        );
    }

    #[test]
    fn load_listing_missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_listing(tmp.path()),
            Err(ListingError::Io { .. })
        ));
    }
}
