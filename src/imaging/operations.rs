//! Optimizing one source: plan the sizes, then drive the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_fit_dimensions, calculate_main_dimensions};
use super::params::{JpegParams, Quality};
use crate::config::BuildConfig;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Sizing and quality for one optimized photo and its thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeConfig {
    pub max_width: u32,
    pub quality: Quality,
    /// Bounding box the thumbnail must fit inside.
    pub thumb_box: (u32, u32),
    pub thumb_quality: Quality,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            quality: Quality::new(85),
            thumb_box: (400, 300),
            thumb_quality: Quality::new(80),
        }
    }
}

impl OptimizeConfig {
    pub fn from_build_config(config: &BuildConfig) -> Self {
        Self {
            max_width: config.images.max_width,
            quality: Quality::new(config.images.quality),
            thumb_box: (config.thumbnails.width, config.thumbnails.height),
            thumb_quality: Quality::new(config.thumbnails.quality),
        }
    }
}

/// Output sizes decided for a source of known dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizePlan {
    pub main: (u32, u32),
    pub thumb: (u32, u32),
}

/// Decide main and thumbnail sizes without touching pixels.
pub fn plan_optimization(source_dims: (u32, u32), config: &OptimizeConfig) -> OptimizePlan {
    OptimizePlan {
        main: calculate_main_dimensions(source_dims, config.max_width),
        thumb: calculate_fit_dimensions(source_dims, config.thumb_box),
    }
}

/// Dimensions actually written for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizedOutput {
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
}

/// Decode `source` once, then write a progressive main JPEG and a
/// progressive thumbnail JPEG.
///
/// Transparent sources are composited onto white first. Both outputs are
/// resampled from the decoded source, never from each other. Parent
/// directories of both outputs are created as needed.
pub fn optimize_image<B: ImageBackend>(
    backend: &B,
    source: &Path,
    main_output: &Path,
    thumb_output: &Path,
    config: &OptimizeConfig,
) -> Result<OptimizedOutput> {
    let mut image = backend.decode(source)?;
    if backend.has_alpha(&image) {
        image = backend.composite_on_white(image);
    }

    let plan = plan_optimization(backend.dimensions(&image).as_tuple(), config);

    ensure_parent(main_output)?;
    let (w, h) = plan.main;
    if (w, h) == backend.dimensions(&image).as_tuple() {
        backend.encode_jpeg(&image, main_output, &JpegParams::progressive(config.quality))?;
    } else {
        let main = backend.resize(&image, w, h);
        backend.encode_jpeg(&main, main_output, &JpegParams::progressive(config.quality))?;
    }

    ensure_parent(thumb_output)?;
    let (tw, th) = plan.thumb;
    let thumb = backend.resize(&image, tw, th);
    backend.encode_jpeg(
        &thumb,
        thumb_output,
        &JpegParams::progressive(config.thumb_quality),
    )?;

    Ok(OptimizedOutput {
        width: w,
        height: h,
        thumb_width: tw,
        thumb_height: th,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
