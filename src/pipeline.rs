//! Build orchestration.
//!
//! ```text
//! listing.json ─┐
//! config.toml  ─┼─ scan → organize → optimize (parallel) → retain survivors
//! photos/      ─┘                                        → resolve hero/agent
//!                                                        → build model
//!                                                        → publish
//! ```
//!
//! A build holds the output lock, writes everything into a staging
//! directory next to the output, and only then swaps the staging directory
//! into place. Any fatal error drops the staging directory, so the
//! previously published output is left untouched.

use crate::cache::CacheStats;
use crate::config::{self, BuildConfig, ConfigError};
use crate::gallery::{GalleryOrganization, organize};
use crate::hero::{resolve_agent, resolve_hero};
use crate::imaging::{ImageBackend, OptimizeConfig, RustBackend};
use crate::listing::{self, Listing, ListingError};
use crate::lock::{LockError, OutputLock};
use crate::model::{MODEL_FILENAME, ListingModel, ModelInputs, build_model};
use crate::process::{
    OptimizedImage, ProcessError, ProcessEvent, ProcessOptions, plan_jobs, process_jobs,
};
use crate::scan::{PhotoCatalog, ScanError, scan_with_backend};
use crate::types::AssetError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("no usable gallery photos in {0}")]
    EmptyGallery(String),
    #[error("output directory {output} must not be inside the listing directory {input}")]
    OutputInsideInput { input: String, output: String },
    #[error("listing directory {input} must not be inside the output directory {output}")]
    InputInsideOutput { input: String, output: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Listing root.
    pub input: PathBuf,
    /// Directory the build is published to. Replaced as a whole.
    pub output: PathBuf,
    pub use_cache: bool,
}

#[derive(Debug)]
pub struct BuildReport {
    pub model: ListingModel,
    /// Non-fatal problems, in discovery order.
    pub warnings: Vec<AssetError>,
    pub cache_stats: CacheStats,
    pub output: PathBuf,
}

/// Result of validating a listing without building it.
#[derive(Debug)]
pub struct CheckReport {
    pub listing: Listing,
    pub config: BuildConfig,
    pub catalog: PhotoCatalog,
    pub gallery: GalleryOrganization,
}

/// Build a listing with the production image backend.
pub fn build(
    options: &BuildOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BuildReport, BuildError> {
    build_with_backend(&RustBackend::new(), options, events)
}

pub fn build_with_backend(
    backend: &impl ImageBackend,
    options: &BuildOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BuildReport, BuildError> {
    let input = options.input.as_path();
    let output = options.output.as_path();
    ensure_separate_dirs(input, output)?;

    let listing = listing::load_listing(input)?;
    let config = config::load_config(input)?;

    let _lock = OutputLock::acquire(output)?;
    info!(input = %input.display(), output = %output.display(), "building listing");

    let catalog = scan_with_backend(input, &listing, backend)?;
    let gallery = organize(&catalog, listing.gallery_mode, &listing.category_order);
    if gallery.is_empty() {
        return Err(BuildError::EmptyGallery(input.display().to_string()));
    }

    let staging = staging_dir(output)?;
    let jobs = plan_jobs(&catalog);
    let processed = process_jobs(
        backend,
        &jobs,
        &ProcessOptions {
            listing_root: input,
            staging_dir: staging.path(),
            previous_output: output.is_dir().then_some(output),
            config: OptimizeConfig::from_build_config(&config),
            threads: config::effective_threads(&config.processing),
            use_cache: options.use_cache,
        },
        events,
    )?;

    let images = processed.images;
    let gallery = gallery.retain_surviving(|p| images.contains_key(&p.source_path));
    if gallery.is_empty() {
        return Err(BuildError::EmptyGallery(input.display().to_string()));
    }

    let hero = resolve_hero(survivor(&catalog.hero, &images), &gallery);
    let agent = resolve_agent(survivor(&catalog.agent, &images));

    let mut warnings = catalog.warnings.clone();
    warnings.extend(processed.warnings);

    let aerials = copy_pass_through(
        input,
        staging.path(),
        &catalog.aerials,
        listing.media.has_aerials,
        &mut warnings,
    );
    let floorplan = copy_pass_through(
        input,
        staging.path(),
        &catalog.floorplan,
        listing.media.has_floorplan,
        &mut warnings,
    );

    let model = build_model(ModelInputs {
        listing: &listing,
        gallery: &gallery,
        hero,
        agent,
        images,
        aerials,
        floorplan,
    });
    fs::write(
        staging.path().join(MODEL_FILENAME),
        serde_json::to_string_pretty(&model)?,
    )?;

    publish(staging, output)?;
    info!(
        photos = model.gallery.items.len(),
        warnings = warnings.len(),
        "published {}",
        output.display()
    );

    Ok(BuildReport {
        model,
        warnings,
        cache_stats: processed.cache_stats,
        output: output.to_path_buf(),
    })
}

/// Validate a listing and show what a build would include, without
/// decoding or writing any images.
pub fn check(input: &Path) -> Result<CheckReport, BuildError> {
    check_with_backend(&RustBackend::new(), input)
}

pub fn check_with_backend(
    backend: &impl ImageBackend,
    input: &Path,
) -> Result<CheckReport, BuildError> {
    let listing = listing::load_listing(input)?;
    let config = config::load_config(input)?;
    let catalog = scan_with_backend(input, &listing, backend)?;
    let gallery = organize(&catalog, listing.gallery_mode, &listing.category_order);
    if gallery.is_empty() {
        return Err(BuildError::EmptyGallery(input.display().to_string()));
    }
    Ok(CheckReport {
        listing,
        config,
        catalog,
        gallery,
    })
}

/// `path`, if it names a source that was optimized successfully.
fn survivor<'a>(
    path: &'a Option<String>,
    images: &BTreeMap<String, OptimizedImage>,
) -> Option<&'a str> {
    path.as_deref().filter(|p| images.contains_key(*p))
}

/// Publishing deletes the old output, so neither directory may contain the
/// other.
fn ensure_separate_dirs(input: &Path, output: &Path) -> Result<(), BuildError> {
    let input_abs = resolve_path(input)?;
    let output_abs = resolve_path(output)?;
    let names = || (input.display().to_string(), output.display().to_string());
    if output_abs.starts_with(&input_abs) {
        let (input, output) = names();
        return Err(BuildError::OutputInsideInput { input, output });
    }
    if input_abs.starts_with(&output_abs) {
        let (input, output) = names();
        return Err(BuildError::InputInsideOutput { input, output });
    }
    Ok(())
}

/// Canonicalize the longest existing prefix of `path` and append the rest,
/// so symlinks and `..` resolve even when the output does not exist yet.
fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return Ok(missing.iter().rev().fold(canonical, |p, name| p.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

/// Create the staging directory as a hidden sibling of the output, so the
/// final rename stays on one filesystem.
fn staging_dir(output: &Path) -> Result<tempfile::TempDir, BuildError> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    Ok(tempfile::Builder::new()
        .prefix(&format!(".{name}.staging-"))
        .tempdir_in(parent)?)
}

/// Replace `output` with the staging directory.
fn publish(staging: tempfile::TempDir, output: &Path) -> Result<(), BuildError> {
    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, output) {
        let _ = fs::remove_dir_all(&staged);
        return Err(e.into());
    }
    Ok(())
}

/// Copy pass-through files verbatim. Returns the output paths of the files
/// copied, or nothing when the section is disabled.
fn copy_pass_through(
    input: &Path,
    staging: &Path,
    files: &[String],
    enabled: bool,
    warnings: &mut Vec<AssetError>,
) -> Vec<String> {
    if !enabled {
        return Vec::new();
    }
    let mut copied = Vec::new();
    for rel in files {
        let target = staging.join(rel);
        let result = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::copy(input.join(rel), &target).map(|_| ()));
        match result {
            Ok(()) => copied.push(rel.clone()),
            Err(e) => {
                warn!(path = %rel, error = %e, "could not copy file");
                warnings.push(AssetError::new(rel, e.to_string()));
            }
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::HeroOrigin;
    use crate::imaging::backend::tests::MockBackend;
    use crate::listing::GalleryMode;
    use crate::test_helpers::{touch, write_listing};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn fixture(files: &[&str], extra: serde_json::Value) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("listing");
        let output = tmp.path().join("dist");
        fs::create_dir_all(&input).unwrap();
        write_listing(&input, extra);
        for f in files {
            touch(&input, f);
        }
        Fixture {
            _tmp: tmp,
            input,
            output,
        }
    }

    fn options(f: &Fixture) -> BuildOptions {
        BuildOptions {
            input: f.input.clone(),
            output: f.output.clone(),
            use_cache: true,
        }
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn filtered_listing_without_hero_uses_first_gallery_photo() {
        let f = fixture(
            &["photos/exterior/a.jpg", "photos/exterior/b.jpg", "photos/kitchen/c.jpg"],
            json!({ "gallery": { "organization": "filtered" } }),
        );
        let backend = MockBackend::with_default(4000, 3000);

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        let model = &report.model;

        assert_eq!(model.gallery.mode, GalleryMode::Filtered);
        let keys: Vec<&str> = model.gallery.categories.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["exterior", "kitchen"]);
        let sources: Vec<&str> = model
            .gallery
            .items
            .iter()
            .map(|i| i.source_path.as_str())
            .collect();
        assert_eq!(
            sources,
            vec!["photos/exterior/a.jpg", "photos/exterior/b.jpg", "photos/kitchen/c.jpg"]
        );
        assert_eq!(model.hero.origin, HeroOrigin::FirstGalleryPhoto);
        assert_eq!(model.hero.source_path.as_deref(), Some("photos/exterior/a.jpg"));
        assert_eq!(model.images["photos/exterior/a.jpg"].width, 1920);
        assert!(f.output.join(MODEL_FILENAME).exists());
        assert!(f.output.join("thumbs/photos/kitchen/c.jpg").exists());
    }

    #[test]
    fn unreadable_photo_is_skipped_with_warning() {
        let f = fixture(&["photos/01.jpg", "photos/02.jpg"], json!({}));
        let backend = MockBackend::with_default(800, 600).failing("02.jpg");

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        assert_eq!(report.model.gallery.items.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, Path::new("photos/02.jpg"));
    }

    #[test]
    fn failed_explicit_hero_falls_back_to_gallery() {
        let f = fixture(&["hero.jpg", "photos/01.jpg"], json!({}));
        let backend = MockBackend::with_default(800, 600).corrupt("hero.jpg");

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        assert_eq!(report.model.hero.origin, HeroOrigin::FirstGalleryPhoto);
        assert_eq!(report.model.hero_image.as_deref(), Some("photos/01.jpg"));
        assert_eq!(report.warnings.len(), 1);
        assert!(!f.output.join("hero.jpg").exists());
    }

    #[test]
    fn decode_failure_re_derives_categories() {
        let f = fixture(
            &["photos/exterior/a.jpg", "photos/kitchen/c.jpg"],
            json!({ "gallery": { "organization": "filtered" } }),
        );
        let backend = MockBackend::with_default(800, 600).corrupt("c.jpg");

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        assert_eq!(report.model.gallery.mode, GalleryMode::Merged);
        assert!(report.model.gallery.categories.is_empty());
        assert_eq!(report.model.gallery.items.len(), 1);
    }

    #[test]
    fn explicit_hero_and_agent() {
        let f = fixture(&["hero.jpg", "agent.jpg", "photos/01.jpg"], json!({}));
        let backend = MockBackend::with_default(800, 600);

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        assert_eq!(report.model.hero.origin, HeroOrigin::ExplicitFile);
        assert_eq!(report.model.hero_image.as_deref(), Some("hero.jpg"));
        assert_eq!(report.model.agent_photo_path.as_deref(), Some("agent/agent.jpg"));
        assert!(f.output.join("hero.jpg").exists());
        assert!(f.output.join("thumbs/agent/agent.jpg").exists());
    }

    #[test]
    fn gallery_photo_named_like_hero_keeps_its_own_thumbnail() {
        let f = fixture(
            &["hero.jpg", "agent.jpg", "photos/hero.png", "photos/agent/agent.png"],
            json!({}),
        );
        let backend = MockBackend::with_default(800, 600).image("photos/hero.png", 600, 800);

        let report = build_with_backend(&backend, &options(&f), None).unwrap();
        let images = &report.model.images;

        let gallery_hero = &images["photos/hero.png"];
        assert_eq!(gallery_hero.thumb_output_path, "thumbs/photos/hero.jpg");
        assert_eq!(
            (gallery_hero.thumb_width, gallery_hero.thumb_height),
            (225, 300)
        );
        assert_eq!(
            fs::read_to_string(f.output.join("thumbs/photos/hero.jpg")).unwrap(),
            "mock 225x300"
        );
        assert_eq!(
            fs::read_to_string(f.output.join("thumbs/hero.jpg")).unwrap(),
            "mock 400x300"
        );
        assert_ne!(
            images["photos/agent/agent.png"].thumb_output_path,
            images["agent.jpg"].thumb_output_path
        );
    }

    // =========================================================================
    // Fatal errors leave the previous output alone
    // =========================================================================

    #[test]
    fn empty_gallery_is_fatal() {
        let f = fixture(&["hero.jpg"], json!({}));
        let result = build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None);
        assert!(matches!(result, Err(BuildError::EmptyGallery(_))));
        assert!(!f.output.exists());
    }

    #[test]
    fn all_photos_failing_is_fatal_and_keeps_previous_output() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None).unwrap();
        let model_before = fs::read_to_string(f.output.join(MODEL_FILENAME)).unwrap();

        // Identifies fine during the scan, fails to decode.
        let backend = MockBackend::with_default(10, 10).corrupt("01.jpg");
        let result = build_with_backend(&backend, &options(&f), None);

        assert!(matches!(result, Err(BuildError::EmptyGallery(_))));
        assert_eq!(
            fs::read_to_string(f.output.join(MODEL_FILENAME)).unwrap(),
            model_before
        );
        let leftovers: Vec<_> = fs::read_dir(f.output.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("staging"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn invalid_listing_is_fatal() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        fs::write(f.input.join("listing.json"), r#"{"title": "x"}"#).unwrap();
        let result = build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None);
        assert!(matches!(
            result,
            Err(BuildError::Listing(ListingError::Validation(_)))
        ));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        fs::write(f.input.join("config.toml"), "[images]\nquality = 0\n").unwrap();
        let result = build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None);
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn locked_output_is_fatal() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        let _held = OutputLock::acquire(&f.output).unwrap();
        let result = build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None);
        assert!(matches!(result, Err(BuildError::Lock(LockError::Locked { .. }))));
    }

    #[test]
    fn output_inside_input_is_rejected() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        let opts = BuildOptions {
            output: f.input.join("dist"),
            ..options(&f)
        };
        let result = build_with_backend(&MockBackend::with_default(10, 10), &opts, None);
        assert!(matches!(result, Err(BuildError::OutputInsideInput { .. })));
    }

    #[test]
    fn input_inside_output_is_rejected_and_left_intact() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("dist");
        let input = output.join("listing");
        write_listing(&input, json!({}));
        touch(&input, "photos/01.jpg");

        let opts = BuildOptions {
            input: input.clone(),
            output: output.clone(),
            use_cache: true,
        };
        let result = build_with_backend(&MockBackend::with_default(10, 10), &opts, None);

        assert!(matches!(result, Err(BuildError::InputInsideOutput { .. })));
        assert!(input.join("listing.json").is_file());
        assert!(input.join("photos/01.jpg").is_file());
    }

    #[test]
    fn output_equal_to_input_through_dot_dot_is_rejected() {
        let f = fixture(&["photos/01.jpg"], json!({}));
        let opts = BuildOptions {
            output: f.input.join("photos").join(".."),
            ..options(&f)
        };
        let result = build_with_backend(&MockBackend::with_default(10, 10), &opts, None);
        assert!(matches!(result, Err(BuildError::OutputInsideInput { .. })));
        assert!(f.input.join("listing.json").is_file());
    }

    // =========================================================================
    // Rebuilds and pass-through media
    // =========================================================================

    #[test]
    fn rebuild_replaces_stale_files() {
        let f = fixture(&["photos/01.jpg", "photos/02.jpg"], json!({}));
        let backend = MockBackend::with_default(10, 10);
        build_with_backend(&backend, &options(&f), None).unwrap();
        assert!(f.output.join("photos/02.jpg").exists());

        fs::remove_file(f.input.join("photos/02.jpg")).unwrap();
        let report = build_with_backend(&backend, &options(&f), None).unwrap();

        assert!(!f.output.join("photos/02.jpg").exists());
        assert_eq!(report.cache_stats.reused, 1);
    }

    #[test]
    fn pass_through_media_copied_when_enabled() {
        let f = fixture(
            &["photos/01.jpg", "aerials/drone.jpg", "floorplan/plan.pdf"],
            json!({ "media": { "has_aerials": true } }),
        );
        let report =
            build_with_backend(&MockBackend::with_default(10, 10), &options(&f), None).unwrap();

        assert_eq!(report.model.aerials, Some(vec!["aerials/drone.jpg".to_string()]));
        assert_eq!(report.model.floorplan, None);
        assert!(f.output.join("aerials/drone.jpg").exists());
        assert!(!f.output.join("floorplan").exists());
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_reports_without_writing() {
        let f = fixture(&["photos/01.jpg", "photos/x/a.jpg"], json!({}));
        let backend = MockBackend::with_default(10, 10);
        let report = check_with_backend(&backend, &f.input).unwrap();

        assert_eq!(report.gallery.items.len(), 2);
        assert!(!f.output.exists());
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, crate::imaging::backend::tests::RecordedOp::Decode(_)))
        );
    }

    #[test]
    fn check_empty_gallery_is_error() {
        let f = fixture(&[], json!({}));
        let result = check_with_backend(&MockBackend::with_default(10, 10), &f.input);
        assert!(matches!(result, Err(BuildError::EmptyGallery(_))));
    }
}
