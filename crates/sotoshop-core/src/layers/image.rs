//! Image layers.

use crate::bitmap::Bitmap;
use serde::{Deserialize, Serialize};

/// CSS-style filter values applied when the bitmap is painted.
///
/// `brightness`, `contrast` and `saturate` are percentages where 100 is the
/// identity; `grayscale` is a percentage where 0 is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    pub brightness: f64,
    pub contrast: f64,
    pub saturate: f64,
    pub grayscale: f64,
}

impl ImageFilters {
    /// Whether painting with these filters leaves pixels untouched.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturate: 100.0,
            grayscale: 0.0,
        }
    }
}

/// Image payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    /// Decoded pixels owned by this layer.
    pub image: Bitmap,
    pub filters: ImageFilters,
    /// Where the pixels came from (file name, URL, generation request id).
    pub original_src: String,
}

impl ImageLayer {
    pub fn new(image: Bitmap, original_src: impl Into<String>) -> Self {
        Self {
            image,
            filters: ImageFilters::default(),
            original_src: original_src.into(),
        }
    }

    pub(crate) fn apply_patch(&mut self, patch: &ImagePatch) {
        if let Some(filters) = patch.filters {
            self.filters = ImageFilters {
                brightness: filters.brightness.max(0.0),
                contrast: filters.contrast.max(0.0),
                saturate: filters.saturate.max(0.0),
                grayscale: filters.grayscale.clamp(0.0, 100.0),
            };
        }
        if let Some(src) = &patch.original_src {
            self.original_src = src.clone();
        }
    }
}

/// Partial update for an image layer. The bitmap itself is replaced only by
/// creating a new layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePatch {
    pub filters: Option<ImageFilters>,
    pub original_src: Option<String>,
}
