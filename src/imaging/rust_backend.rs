//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate decoders, format sniffed from content |
//! | Composite on white | per-pixel alpha blend over `RgbImage` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `jpeg-encoder` (progressive scans, optimized Huffman tables) |
//!
//! Palette images are expanded by the decoders: a palette with transparent
//! entries arrives as RGBA and goes through the same composite path as any
//! other alpha image.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::JpegParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions accepted as gallery candidates, paired with their decoder.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Blend one channel over white: `c * a + 255 * (1 - a)`, rounded.
#[inline]
fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        open_reader(path)?.decode().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions {
            width: image.width(),
            height: image.height(),
        }
    }

    fn has_alpha(&self, image: &DynamicImage) -> bool {
        image.color().has_alpha()
    }

    fn composite_on_white(&self, image: DynamicImage) -> DynamicImage {
        if !image.color().has_alpha() {
            return image;
        }
        let rgba = image.to_rgba8();
        let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            image::Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
        });
        DynamicImage::ImageRgb8(flattened)
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        output: &Path,
        params: &JpegParams,
    ) -> Result<(), BackendError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(BackendError::ProcessingFailed(format!(
                    "{}x{} exceeds the JPEG size limit",
                    width, height
                )));
            }
        };

        let quality = params.quality.value().clamp(1, 100) as u8;
        let mut encoder = jpeg_encoder::Encoder::new_file(output, quality).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to create {}: {}", output.display(), e))
        })?;
        encoder.set_progressive(params.progressive);
        encoder.set_optimized_huffman_tables(true);
        encoder
            .encode(rgb.as_raw(), w16, h16, jpeg_encoder::ColorType::Rgb)
            .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
    }
}
