//! Hero and agent photo resolution.
//!
//! The hero is chosen by a fixed chain: an explicit hero file, else the
//! first photo of the final gallery, else nothing. The agent portrait is
//! only ever an explicit file; it is never borrowed from the gallery.

use crate::gallery::GalleryOrganization;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeroOrigin {
    ExplicitFile,
    FirstGalleryPhoto,
    None,
}

/// The chosen hero image. `origin` is [`HeroOrigin::None`] exactly when
/// `source_path` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroSelection {
    pub source_path: Option<String>,
    pub origin: HeroOrigin,
}

impl HeroSelection {
    pub fn none() -> Self {
        Self {
            source_path: None,
            origin: HeroOrigin::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPhoto {
    pub source_path: Option<String>,
    pub present: bool,
}

/// Pick the hero for a gallery.
///
/// `explicit` is a hero file that exists and was optimized successfully;
/// pass `None` when there is no such file or it failed.
pub fn resolve_hero(explicit: Option<&str>, gallery: &GalleryOrganization) -> HeroSelection {
    if let Some(path) = explicit {
        return HeroSelection {
            source_path: Some(path.to_string()),
            origin: HeroOrigin::ExplicitFile,
        };
    }
    match gallery.first() {
        Some(photo) => HeroSelection {
            source_path: Some(photo.source_path.clone()),
            origin: HeroOrigin::FirstGalleryPhoto,
        },
        None => HeroSelection::none(),
    }
}

pub fn resolve_agent(explicit: Option<&str>) -> AgentPhoto {
    AgentPhoto {
        source_path: explicit.map(str::to_string),
        present: explicit.is_some(),
    }
}
