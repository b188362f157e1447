//! Decoded raster images owned by image layers.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while turning encoded bytes into a [`Bitmap`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No image data")]
    Empty,
    #[error("Image has zero width or height")]
    ZeroSized,
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// A decoded, straight-alpha RGBA8 bitmap.
///
/// Pixels live behind an `Arc`, so the history snapshots that clone a layer
/// share one buffer.
#[derive(Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap raw RGBA8 pixels. Returns `None` if the buffer length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    /// Decode PNG, JPEG, WebP, GIF (first frame) or BMP bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ImportError> {
        if data.is_empty() {
            return Err(ImportError::Empty);
        }
        let decoded =
            image::load_from_memory(data).map_err(|e| ImportError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImportError::ZeroSized);
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(rgba.into_raw()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Shared handle to the pixel buffer (for zero-copy hand-off to renderers).
    pub fn shared_pixels(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.pixels)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || self.pixels == other.pixels)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
