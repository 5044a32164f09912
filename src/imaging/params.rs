//! Parameter types for image operations.
//!
//! These describe *what* to produce, not *how*. They sit between the
//! high-level [`operations`](super::operations) module and the
//! [`backend`](super::backend), which does the pixel work.
//!
//! - [`Quality`]: JPEG encoding quality (1-100, default 85). Clamped on construction.
//! - [`JpegParams`]: quality plus scan order.

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// How a JPEG file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegParams {
    pub quality: Quality,
    /// Progressive scans. Huffman tables are always optimized.
    pub progressive: bool,
}

impl JpegParams {
    pub fn progressive(quality: Quality) -> Self {
        Self {
            quality,
            progressive: true,
        }
    }
}
