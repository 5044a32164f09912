//! Image optimization: decode, flatten, resize, encode progressive JPEG.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Composite** | alpha blend onto white |
//! | **Resize** | Lanczos3 via `image` |
//! | **Encode** | `jpeg-encoder`, progressive with optimized Huffman tables |
//!
//! Output sizes come from pure functions in `calculations`. Pixel work goes
//! through the [`ImageBackend`] trait, implemented for real by
//! [`RustBackend`]. [`optimize_image`] ties the two together for one source.

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_fit_dimensions, calculate_main_dimensions};
pub use operations::{
    OptimizeConfig, OptimizePlan, OptimizedOutput, optimize_image, plan_optimization,
};
pub use params::{JpegParams, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
