//! Text layers.

use crate::color::RgbaColor;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of text inside the layer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub content: String,
    /// Font family name, resolved by the renderer.
    pub font: String,
    /// Font size in pixels.
    pub size: f64,
    pub color: RgbaColor,
    pub text_align: TextAlign,
}

impl TextLayer {
    pub const DEFAULT_FONT: &'static str = "sans-serif";
    pub const DEFAULT_SIZE: f64 = 48.0;

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font: Self::DEFAULT_FONT.to_string(),
            size: Self::DEFAULT_SIZE,
            color: RgbaColor::black(),
            text_align: TextAlign::Left,
        }
    }

    pub(crate) fn apply_patch(&mut self, patch: &TextPatch) {
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(font) = &patch.font {
            self.font = font.clone();
        }
        if let Some(size) = patch.size {
            self.size = size.max(1.0);
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(align) = patch.text_align {
            self.text_align = align;
        }
    }
}

/// Partial update for a text layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font: Option<String>,
    pub size: Option<f64>,
    pub color: Option<RgbaColor>,
    pub text_align: Option<TextAlign>,
}
