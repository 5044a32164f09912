//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the minimal codec capability the optimizer
//! needs: identify, decode, composite onto white, resize, and encode JPEG.
//! The optimizer's contract is written against this trait only, so it does
//! not depend on any particular imaging library.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::JpegParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Codec capability used by the optimizer.
///
/// Implementations must be `Sync`: the process stage shares one backend
/// across the worker pool.
pub trait ImageBackend: Sync {
    /// Decoded in-memory image.
    type Image: Send;

    /// Read image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image file.
    fn decode(&self, path: &Path) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// True when the image carries transparency (alpha channel or a palette
    /// with transparent entries).
    fn has_alpha(&self, image: &Self::Image) -> bool;

    /// Flatten onto an opaque white background.
    fn composite_on_white(&self, image: Self::Image) -> Self::Image;

    /// Resample to exactly `width` × `height` with a high-quality filter.
    fn resize(&self, image: &Self::Image, width: u32, height: u32) -> Self::Image;

    /// Encode as JPEG and write to `output`.
    fn encode_jpeg(
        &self,
        image: &Self::Image,
        output: &Path,
        params: &JpegParams,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// In-memory stand-in for a decoded image.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockImage {
        pub source: String,
        pub width: u32,
        pub height: u32,
        pub alpha: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Decode(String),
        CompositeOnWhite(String),
        Resize {
            source: String,
            width: u32,
            height: u32,
        },
        EncodeJpeg {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
            progressive: bool,
        },
    }

    /// Mock backend that records operations without touching pixels.
    ///
    /// Images are registered by a path suffix (`"exterior/a.jpg"`); any path
    /// ending with those components resolves to the registered dimensions.
    /// Unregistered paths fall back to the default dimensions, if set.
    /// `encode_jpeg` writes a small placeholder file so on-disk output sets
    /// can be asserted. Uses Mutex (not RefCell) so it is Sync and works with
    /// rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        images: Vec<(String, MockImage)>,
        failing: Vec<String>,
        corrupt: Vec<String>,
        default: Option<Dimensions>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every path decodes to `width` × `height` unless registered otherwise.
        pub fn with_default(width: u32, height: u32) -> Self {
            Self {
                default: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        pub fn image(mut self, suffix: &str, width: u32, height: u32) -> Self {
            self.images.push((
                suffix.to_string(),
                MockImage {
                    source: suffix.to_string(),
                    width,
                    height,
                    alpha: false,
                },
            ));
            self
        }

        pub fn alpha_image(mut self, suffix: &str, width: u32, height: u32) -> Self {
            self.images.push((
                suffix.to_string(),
                MockImage {
                    source: suffix.to_string(),
                    width,
                    height,
                    alpha: true,
                },
            ));
            self
        }

        /// Paths ending with `suffix` fail to identify and decode.
        pub fn failing(mut self, suffix: &str) -> Self {
            self.failing.push(suffix.to_string());
            self
        }

        /// Paths ending with `suffix` identify fine but fail to decode.
        pub fn corrupt(mut self, suffix: &str) -> Self {
            self.corrupt.push(suffix.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn lookup(&self, path: &Path) -> Result<MockImage, BackendError> {
            if self.failing.iter().any(|s| path.ends_with(s)) {
                return Err(BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: corrupt data",
                    path.display()
                )));
            }
            if let Some((_, image)) = self.images.iter().find(|(s, _)| path.ends_with(s)) {
                return Ok(image.clone());
            }
            self.default
                .map(|d| MockImage {
                    source: path.to_string_lossy().to_string(),
                    width: d.width,
                    height: d.height,
                    alpha: false,
                })
                .ok_or_else(|| {
                    BackendError::ProcessingFailed(format!("No mock image for {}", path.display()))
                })
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        type Image = MockImage;

        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.record(RecordedOp::Identify(path.to_string_lossy().to_string()));
            let image = self.lookup(path)?;
            Ok(Dimensions {
                width: image.width,
                height: image.height,
            })
        }

        fn decode(&self, path: &Path) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Decode(path.to_string_lossy().to_string()));
            if self.corrupt.iter().any(|s| path.ends_with(s)) {
                return Err(BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: truncated data",
                    path.display()
                )));
            }
            self.lookup(path)
        }

        fn dimensions(&self, image: &MockImage) -> Dimensions {
            Dimensions {
                width: image.width,
                height: image.height,
            }
        }

        fn has_alpha(&self, image: &MockImage) -> bool {
            image.alpha
        }

        fn composite_on_white(&self, image: MockImage) -> MockImage {
            self.record(RecordedOp::CompositeOnWhite(image.source.clone()));
            MockImage {
                alpha: false,
                ..image
            }
        }

        fn resize(&self, image: &MockImage, width: u32, height: u32) -> MockImage {
            self.record(RecordedOp::Resize {
                source: image.source.clone(),
                width,
                height,
            });
            MockImage {
                width,
                height,
                ..image.clone()
            }
        }

        fn encode_jpeg(
            &self,
            image: &MockImage,
            output: &Path,
            params: &JpegParams,
        ) -> Result<(), BackendError> {
            self.record(RecordedOp::EncodeJpeg {
                source: image.source.clone(),
                output: output.to_string_lossy().to_string(),
                width: image.width,
                height: image.height,
                quality: params.quality.value(),
                progressive: params.progressive,
            });
            std::fs::write(output, format!("mock {}x{}", image.width, image.height))?;
            Ok(())
        }
    }

    #[test]
    fn mock_resolves_registered_suffix() {
        let backend = MockBackend::new().image("exterior/a.jpg", 800, 600);

        let dims = backend
            .identify(Path::new("/listing/photos/exterior/a.jpg"))
            .unwrap();
        assert_eq!(dims.as_tuple(), (800, 600));

        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p.ends_with("exterior/a.jpg")));
    }

    #[test]
    fn mock_suffix_matches_whole_components() {
        let backend = MockBackend::new().image("a.jpg", 800, 600);
        assert!(backend.identify(Path::new("/photos/banana.jpg")).is_err());
    }

    #[test]
    fn mock_failing_path_errors() {
        let backend = MockBackend::with_default(100, 100).failing("bad.jpg");
        assert!(backend.decode(Path::new("/photos/bad.jpg")).is_err());
        assert!(backend.decode(Path::new("/photos/good.jpg")).is_ok());
    }

    #[test]
    fn mock_corrupt_path_identifies_but_fails_decode() {
        let backend = MockBackend::with_default(100, 100).corrupt("bad.jpg");
        assert!(backend.identify(Path::new("/photos/bad.jpg")).is_ok());
        assert!(backend.decode(Path::new("/photos/bad.jpg")).is_err());
    }

    #[test]
    fn mock_records_resize_and_encode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::with_default(4000, 3000);
        let image = backend.decode(Path::new("/a.jpg")).unwrap();
        let resized = backend.resize(&image, 1920, 1440);
        let out = tmp.path().join("a.jpg");
        backend
            .encode_jpeg(&resized, &out, &JpegParams::progressive(Quality::new(85)))
            .unwrap();

        assert!(out.exists());
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(
            &ops[2],
            RecordedOp::EncodeJpeg {
                width: 1920,
                height: 1440,
                quality: 85,
                progressive: true,
                ..
            }
        ));
    }
}
