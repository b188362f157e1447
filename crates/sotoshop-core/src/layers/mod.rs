//! Layer definitions for the canvas document.

mod blend;
mod image;
mod shape;
mod text;

pub use blend::BlendMode;
pub use image::{ImageFilters, ImageLayer, ImagePatch};
pub use shape::{ShapeKind, ShapeLayer, ShapePatch};
pub use text::{TextAlign, TextLayer, TextPatch};

use crate::bitmap::Bitmap;
use crate::color::RgbaColor;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// Drop shadow painted beneath a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: RgbaColor,
}

impl Shadow {
    /// Whether the shadow would paint anything.
    pub fn is_visible(&self) -> bool {
        self.color.is_visible()
            && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: RgbaColor::transparent(),
        }
    }
}

/// Variant-specific payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Text(TextLayer),
    Image(ImageLayer),
    Shape(ShapeLayer),
}

impl LayerKind {
    /// Short label for panels ("Text", "Image", "Shape").
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Text(_) => "Text",
            LayerKind::Image(_) => "Image",
            LayerKind::Shape(_) => "Shape",
        }
    }
}

/// One visual element of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    /// Left edge of the unrotated box, in document space.
    pub x: f64,
    /// Top edge of the unrotated box, in document space.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees about the layer center.
    pub rotation: f64,
    pub is_visible: bool,
    pub is_locked: bool,
    /// Opacity as a percentage (0..=100).
    pub opacity: f64,
    pub shadow: Shadow,
    pub blend_mode: BlendMode,
    pub kind: LayerKind,
}

impl Layer {
    /// Build a layer from its creation data. The id is owned by the caller.
    pub(crate) fn from_new(id: LayerId, new: NewLayer) -> Self {
        let NewLayer {
            name,
            x,
            y,
            width,
            height,
            rotation,
            is_visible,
            is_locked,
            opacity,
            shadow,
            blend_mode,
            kind,
        } = new;
        Self {
            id,
            name,
            x,
            y,
            width,
            height,
            rotation,
            is_visible,
            is_locked,
            opacity: opacity.clamp(0.0, 100.0),
            shadow,
            blend_mode,
            kind,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// The unrotated box in document space.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Layer-local to document transform. Local space spans `(0, 0)..(width, height)`.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center().to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::translate((-self.width / 2.0, -self.height / 2.0))
    }

    /// Map a document point into layer-local space.
    pub fn to_local(&self, point: Point) -> Point {
        self.transform().inverse() * point
    }

    /// Whether a document point lies inside the rotated layer box.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.to_local(point);
        local.x >= 0.0 && local.y >= 0.0 && local.x <= self.width && local.y <= self.height
    }

    /// Axis-aligned bounds of the rotated box.
    pub fn bounds(&self) -> Rect {
        self.transform()
            .transform_rect_bbox(Rect::new(0.0, 0.0, self.width, self.height))
    }

    /// Opacity as a 0.0..=1.0 factor.
    pub fn alpha(&self) -> f32 {
        (self.opacity.clamp(0.0, 100.0) / 100.0) as f32
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeLayer> {
        match &self.kind {
            LayerKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// Apply a partial update. Variant sub-patches that do not match are ignored.
    pub fn apply_patch(&mut self, patch: &LayerPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(visible) = patch.is_visible {
            self.is_visible = visible;
        }
        if let Some(locked) = patch.is_locked {
            self.is_locked = locked;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 100.0);
        }
        if let Some(shadow) = patch.shadow {
            self.shadow = shadow;
        }
        if let Some(blend_mode) = patch.blend_mode {
            self.blend_mode = blend_mode;
        }
        match &mut self.kind {
            LayerKind::Text(text) => {
                if let Some(p) = &patch.text {
                    text.apply_patch(p);
                }
            }
            LayerKind::Image(image) => {
                if let Some(p) = &patch.image {
                    image.apply_patch(p);
                }
            }
            LayerKind::Shape(shape) => {
                if let Some(p) = &patch.shape {
                    shape.apply_patch(p);
                }
            }
        }
    }
}

/// Creation data for a layer: everything except the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLayer {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub is_visible: bool,
    pub is_locked: bool,
    pub opacity: f64,
    pub shadow: Shadow,
    pub blend_mode: BlendMode,
    pub kind: LayerKind,
}

impl NewLayer {
    fn with_kind(name: &str, width: f64, height: f64, kind: LayerKind) -> Self {
        Self {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            is_visible: true,
            is_locked: false,
            opacity: 100.0,
            shadow: Shadow::default(),
            blend_mode: BlendMode::Normal,
            kind,
        }
    }

    /// A text layer sized for a single line of `content` at the default font size.
    pub fn text(content: impl Into<String>) -> Self {
        let text = TextLayer::new(content);
        let height = (text.size * 1.4).ceil();
        let width = (text.content.chars().count().max(4) as f64 * text.size * 0.6).ceil();
        Self::with_kind("Text", width, height, LayerKind::Text(text))
    }

    /// A 200x200 shape layer.
    pub fn shape(shape: ShapeKind) -> Self {
        let name = match shape {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
        };
        Self::with_kind(name, 200.0, 200.0, LayerKind::Shape(ShapeLayer::new(shape)))
    }

    /// An image layer at the bitmap's natural size.
    pub fn image(image: Bitmap, original_src: impl Into<String>) -> Self {
        let (width, height) = (image.width() as f64, image.height() as f64);
        Self::with_kind(
            "Image",
            width,
            height,
            LayerKind::Image(ImageLayer::new(image, original_src)),
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Scale to fit inside `max_width` x `max_height` (aspect preserved, never enlarged)
    /// and center on that box.
    pub fn fit_within(mut self, max_width: f64, max_height: f64) -> Self {
        let scale = (max_width / self.width.max(1.0))
            .min(max_height / self.height.max(1.0))
            .min(1.0);
        self.width = (self.width * scale).max(1.0);
        self.height = (self.height * scale).max(1.0);
        self.x = (max_width - self.width) / 2.0;
        self.y = (max_height - self.height) / 2.0;
        self
    }
}

/// Partial update for a layer. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub is_visible: Option<bool>,
    pub is_locked: Option<bool>,
    pub opacity: Option<f64>,
    pub shadow: Option<Shadow>,
    pub blend_mode: Option<BlendMode>,
    pub text: Option<TextPatch>,
    pub image: Option<ImagePatch>,
    pub shape: Option<ShapePatch>,
}

impl LayerPatch {
    /// Patch that sets the position.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch carrying the full transform of `layer`.
    pub fn transform_of(layer: &Layer) -> Self {
        Self {
            x: Some(layer.x),
            y: Some(layer.y),
            width: Some(layer.width),
            height: Some(layer.height),
            rotation: Some(layer.rotation),
            ..Self::default()
        }
    }
}
