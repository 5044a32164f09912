//! CLI output formatting.
//!
//! Output is information-first: a listing is shown as a gallery inventory
//! (sections, positional indices, filenames) with source paths as indented
//! context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Harbor Loft
//!     Address: 4 Dock St
//!     Price: $850,000
//!
//! Gallery (filtered, 3 photos)
//! 001 Exterior (2 photos)
//!     001 a.jpg
//!         Source: photos/exterior/a.jpg
//!     002 b.jpg
//!         Source: photos/exterior/b.jpg
//! 002 Kitchen (1 photos)
//!     003 c.jpg
//!         Source: photos/kitchen/c.jpg
//!
//! Hero
//!     photos/exterior/a.jpg (first gallery photo)
//! ```
//!
//! ## Build
//!
//! ```text
//! Optimizing 4 images on 8 threads
//!     photos/exterior/a.jpg → photos/exterior/a.jpg (1920x1280, encoded)
//!     hero.jpg → hero.jpg (1920x1080, reused)
//!     ! photos/broken.jpg: Failed to decode ...
//! Built 3 photos (merged) → dist
//!     Hero: hero.jpg
//!     Cache: 1 reused, 2 encoded (3 total)
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function returns `Vec<String>` and has no side effects;
//! the matching `print_*` wrapper writes the lines to stdout or stderr.

use crate::hero::{HeroOrigin, HeroSelection};
use crate::model::format_price;
use crate::pipeline::{BuildReport, CheckReport};
use crate::process::{JobKind, OutputStatus, ProcessEvent};
use crate::types::{AssetError, PhotoAsset};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Section header: positional index + label + photo count.
fn section_header(index: usize, label: &str, count: usize) -> String {
    format!("{} {} ({} photos)", format_index(index), label, count)
}

fn hero_line(hero: &HeroSelection) -> String {
    match (&hero.source_path, hero.origin) {
        (Some(path), HeroOrigin::ExplicitFile) => format!("{path} (explicit file)"),
        (Some(path), _) => format!("{path} (first gallery photo)"),
        (None, _) => "none".to_string(),
    }
}

/// Split gallery items into consecutive runs sharing a category.
fn sections(items: &[PhotoAsset]) -> Vec<(Option<&str>, &[PhotoAsset])> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || items[i].category != items[start].category {
            runs.push((items[start].category.as_deref(), &items[start..i]));
            start = i;
        }
    }
    runs
}

// ============================================================================
// Check
// ============================================================================

/// Format the `check` report: listing facts, gallery inventory, hero,
/// agent, pass-through media, and warnings.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    let listing = &report.listing;

    lines.push(listing.title.clone());
    lines.push(format!("{}Address: {}", indent(1), listing.address));
    if let Some(price) = format_price(listing.details.price) {
        lines.push(format!("{}Price: {}", indent(1), price));
    }
    lines.push(String::new());

    let gallery = &report.gallery;
    if gallery.mode != gallery.requested_mode() {
        lines.push(format!(
            "Gallery ({}, {} photos; {} needs two or more categories)",
            gallery.mode,
            gallery.items.len(),
            gallery.requested_mode()
        ));
    } else {
        lines.push(format!(
            "Gallery ({}, {} photos)",
            gallery.mode,
            gallery.items.len()
        ));
    }
    for (pos, (category, photos)) in sections(&gallery.items).into_iter().enumerate() {
        let label = category
            .map(crate::naming::category_label)
            .unwrap_or_else(|| "Uncategorized".to_string());
        lines.push(section_header(pos + 1, &label, photos.len()));
        for photo in photos {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(photo.order + 1),
                photo.filename
            ));
            lines.push(format!("{}Source: {}", indent(2), photo.source_path));
        }
    }
    lines.push(String::new());

    lines.push("Hero".to_string());
    let hero = crate::hero::resolve_hero(report.catalog.hero.as_deref(), gallery);
    lines.push(format!("{}{}", indent(1), hero_line(&hero)));

    lines.push("Agent".to_string());
    lines.push(format!(
        "{}{}",
        indent(1),
        report.catalog.agent.as_deref().unwrap_or("none")
    ));

    let media = [
        ("Aerials", &report.catalog.aerials, listing.media.has_aerials),
        ("Floorplan", &report.catalog.floorplan, listing.media.has_floorplan),
    ];
    for (label, files, enabled) in media {
        if files.is_empty() && !enabled {
            continue;
        }
        let state = if enabled { "" } else { " (disabled in listing)" };
        lines.push(format!("{label}{state}"));
        if files.is_empty() {
            lines.push(format!("{}no files", indent(1)));
        }
        for file in files {
            lines.push(format!("{}{}", indent(1), file));
        }
    }

    lines.extend(format_warnings(&report.catalog.warnings));
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { total, threads } => {
            vec![format!("Optimizing {} images on {} threads", total, threads)]
        }
        ProcessEvent::Optimized {
            kind,
            source_path,
            main_output,
            width,
            height,
            status,
        } => {
            let status = match status {
                OutputStatus::Encoded => "encoded",
                OutputStatus::Reused => "reused",
            };
            let role = match kind {
                JobKind::Gallery => "",
                JobKind::Hero => " [hero]",
                JobKind::Agent => " [agent]",
            };
            vec![format!(
                "{}{} \u{2192} {} ({}x{}, {}){}",
                indent(1),
                source_path,
                main_output,
                width,
                height,
                status,
                role
            )]
        }
        ProcessEvent::Failed {
            source_path,
            reason,
        } => vec![format!("{}! {}: {}", indent(1), source_path, reason)],
    }
}

/// Format the summary printed after a successful build.
pub fn format_build_summary(report: &BuildReport) -> Vec<String> {
    let model = &report.model;
    let mut header = format!(
        "Built {} photos ({}",
        model.gallery.items.len(),
        model.gallery.mode
    );
    if !model.gallery.categories.is_empty() {
        header.push_str(&format!(", {} categories", model.gallery.categories.len()));
    }
    header.push_str(&format!(") \u{2192} {}", report.output.display()));

    let mut lines = vec![header];
    lines.push(format!("{}Hero: {}", indent(1), hero_line(&model.hero)));
    if let Some(agent) = &model.agent_photo_path {
        lines.push(format!("{}Agent: {}", indent(1), agent));
    }
    lines.push(format!("{}Cache: {}", indent(1), report.cache_stats));
    lines
}

pub fn print_build_summary(report: &BuildReport) {
    for line in format_build_summary(report) {
        println!("{}", line);
    }
}

/// Format collected asset warnings. Empty when there are none.
pub fn format_warnings(warnings: &[AssetError]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let noun = if warnings.len() == 1 { "warning" } else { "warnings" };
    let mut lines = vec![format!("{} {}", warnings.len(), noun)];
    lines.extend(warnings.iter().map(|w| format!("{}{}", indent(1), w)));
    lines
}

pub fn print_warnings(warnings: &[AssetError]) {
    for line in format_warnings(warnings) {
        eprintln!("{}", line);
    }
}
