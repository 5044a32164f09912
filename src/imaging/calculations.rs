//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Output dimensions are decided here, never by the imaging library, so the
//! same source dimensions and config always give the same output size.

/// Dimensions of the main (web-sized) image.
///
/// Images wider than `max_width` are scaled so their width is exactly
/// `max_width`, height scaled by the same factor and rounded. Narrower
/// images keep their original size (never upscaled).
///
/// ```
/// # use tour_gen::imaging::calculate_main_dimensions;
/// assert_eq!(calculate_main_dimensions((4000, 3000), 1920), (1920, 1440));
/// assert_eq!(calculate_main_dimensions((1200, 800), 1920), (1200, 800));
/// ```
pub fn calculate_main_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width || src_w == 0 {
        return source;
    }
    let ratio = max_width as f64 / src_w as f64;
    let h = (src_h as f64 * ratio).round().max(1.0) as u32;
    (max_width, h)
}

/// Dimensions that fit entirely inside `bounds`, preserving aspect ratio.
///
/// Scales down only: an image already inside the box is returned unchanged.
/// The result never exceeds the box on either axis and is at least 1×1.
///
/// ```
/// # use tour_gen::imaging::calculate_fit_dimensions;
/// // Landscape 3:2 into 400x300 → width-limited
/// assert_eq!(calculate_fit_dimensions((3000, 2000), (400, 300)), (400, 267));
/// // Portrait into 400x300 → height-limited
/// assert_eq!(calculate_fit_dimensions((2000, 3000), (400, 300)), (200, 300));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (box_w, box_h) = bounds;
    if src_w == 0 || src_h == 0 || (src_w <= box_w && src_h <= box_h) {
        return source;
    }

    let scale = (box_w as f64 / src_w as f64).min(box_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, box_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, box_h.max(1));
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_main_dimensions tests
    // =========================================================================

    #[test]
    fn main_scales_wide_image_to_max_width() {
        assert_eq!(calculate_main_dimensions((4000, 3000), 1920), (1920, 1440));
    }

    #[test]
    fn main_rounds_height() {
        // 3000x2001 → 1920 x 1280.64 → 1281
        assert_eq!(calculate_main_dimensions((3000, 2001), 1920), (1920, 1281));
    }

    #[test]
    fn main_never_upscales() {
        assert_eq!(calculate_main_dimensions((800, 600), 1920), (800, 600));
    }

    #[test]
    fn main_exact_max_width_passes_through() {
        assert_eq!(calculate_main_dimensions((1920, 1080), 1920), (1920, 1080));
    }

    #[test]
    fn main_tall_narrow_image_untouched() {
        // Width is the only constraint; tall images are not height-limited.
        assert_eq!(calculate_main_dimensions((1000, 5000), 1920), (1000, 5000));
    }

    #[test]
    fn main_extreme_panorama_keeps_one_pixel_height() {
        assert_eq!(calculate_main_dimensions((100_000, 10), 1920), (1920, 1));
    }

    // =========================================================================
    // calculate_fit_dimensions tests
    // =========================================================================

    #[test]
    fn fit_landscape_is_width_limited() {
        assert_eq!(calculate_fit_dimensions((3000, 2000), (400, 300)), (400, 267));
    }

    #[test]
    fn fit_portrait_is_height_limited() {
        assert_eq!(calculate_fit_dimensions((2000, 3000), (400, 300)), (200, 300));
    }

    #[test]
    fn fit_same_aspect_fills_box() {
        assert_eq!(calculate_fit_dimensions((1600, 1200), (400, 300)), (400, 300));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(calculate_fit_dimensions((200, 100), (400, 300)), (200, 100));
    }

    #[test]
    fn fit_one_axis_over() {
        // Only height exceeds: 350x600 into 400x300 → 175x300
        assert_eq!(calculate_fit_dimensions((350, 600), (400, 300)), (175, 300));
    }

    #[test]
    fn fit_stays_inside_box_and_keeps_aspect() {
        let bounds = (400, 300);
        for source in [(4032, 3024), (3024, 4032), (5000, 17), (17, 5000), (1234, 987)] {
            let (w, h) = calculate_fit_dimensions(source, bounds);
            assert!(w <= bounds.0 && h <= bounds.1, "{source:?} → {w}x{h}");
            // The limiting axis is exact; the other is within rounding.
            let expected_h = source.1 as f64 * w as f64 / source.0 as f64;
            let expected_w = source.0 as f64 * h as f64 / source.1 as f64;
            assert!(
                (h as f64 - expected_h).abs() <= 1.0 || (w as f64 - expected_w).abs() <= 1.0,
                "{source:?} → {w}x{h} breaks aspect ratio"
            );
        }
    }
}
