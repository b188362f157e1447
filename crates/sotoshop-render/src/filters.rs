//! CPU image filters for image layers.
//!
//! Filters run on straight (non-premultiplied) RGBA8 in the order
//! brightness, contrast, saturate, grayscale. Each stage clamps to 0..=1.
//! Alpha is left untouched.

use sotoshop_core::layers::ImageFilters;

fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn apply_matrix(rgb: [f32; 3], m: &[[f32; 3]; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    [
        (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 1.0),
        (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 1.0),
        (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 1.0),
    ]
}

/// Apply `filters` to straight RGBA8 pixels, returning a new buffer.
pub fn apply_filters(pixels: &[u8], filters: &ImageFilters) -> Vec<u8> {
    if filters.is_identity() {
        return pixels.to_vec();
    }

    let brightness = (filters.brightness / 100.0).max(0.0) as f32;
    let contrast = (filters.contrast / 100.0).max(0.0) as f32;
    let saturate = (filters.saturate != 100.0)
        .then(|| saturate_matrix((filters.saturate / 100.0).max(0.0) as f32));
    let grayscale = (filters.grayscale != 0.0)
        .then(|| saturate_matrix(1.0 - (filters.grayscale / 100.0).clamp(0.0, 1.0) as f32));

    let mut out = Vec::with_capacity(pixels.len());
    for px in pixels.chunks_exact(4) {
        let mut rgb = [px[0], px[1], px[2]].map(|c| f32::from(c) / 255.0);
        rgb = rgb.map(|c| (c * brightness).clamp(0.0, 1.0));
        rgb = rgb.map(|c| ((c - 0.5) * contrast + 0.5).clamp(0.0, 1.0));
        if let Some(m) = &saturate {
            rgb = apply_matrix(rgb, m);
        }
        if let Some(m) = &grayscale {
            rgb = apply_matrix(rgb, m);
        }
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        out.extend_from_slice(&[r, g, b, px[3]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(brightness: f64, contrast: f64, saturate: f64, grayscale: f64) -> ImageFilters {
        ImageFilters {
            brightness,
            contrast,
            saturate,
            grayscale,
        }
    }

    #[test]
    fn test_identity_is_copy() {
        let pixels = vec![12, 34, 56, 78, 200, 100, 0, 255];
        assert_eq!(apply_filters(&pixels, &ImageFilters::default()), pixels);
    }

    #[test]
    fn test_brightness() {
        let out = apply_filters(&[100, 200, 50, 255], &filters(50.0, 100.0, 100.0, 0.0));
        assert_eq!(out, vec![50, 100, 25, 255]);
        let out = apply_filters(&[100, 200, 50, 255], &filters(200.0, 100.0, 100.0, 0.0));
        assert_eq!(out, vec![200, 255, 100, 255]);
    }

    #[test]
    fn test_zero_contrast_is_mid_grey() {
        let out = apply_filters(&[0, 255, 30, 10], &filters(100.0, 0.0, 100.0, 0.0));
        assert_eq!(out, vec![128, 128, 128, 10]);
    }

    #[test]
    fn test_full_grayscale_equalizes_channels() {
        let out = apply_filters(&[255, 0, 0, 255], &filters(100.0, 100.0, 100.0, 100.0));
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        // Red luminance weight.
        assert_eq!(out[0], 54);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_zero_saturate_matches_grayscale() {
        let pixel = [40, 180, 90, 255];
        let desaturated = apply_filters(&pixel, &filters(100.0, 100.0, 0.0, 0.0));
        let grey = apply_filters(&pixel, &filters(100.0, 100.0, 100.0, 100.0));
        assert_eq!(desaturated, grey);
    }

    #[test]
    fn test_grey_pixels_survive_saturation() {
        let out = apply_filters(&[90, 90, 90, 255], &filters(100.0, 100.0, 300.0, 0.0));
        for c in &out[..3] {
            assert!((i32::from(*c) - 90).abs() <= 1);
        }
    }
}
