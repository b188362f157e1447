//! Shape layers.

use crate::color::RgbaColor;
use kurbo::{BezPath, Ellipse, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Geometric primitive drawn by a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    /// Ellipse inscribed in the layer box (a circle when the box is square).
    Circle,
}

/// Shape payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeLayer {
    pub shape: ShapeKind,
    pub fill_color: RgbaColor,
    pub stroke_color: RgbaColor,
    pub stroke_width: f64,
}

impl ShapeLayer {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            fill_color: RgbaColor::rgb(59, 130, 246),
            stroke_color: RgbaColor::transparent(),
            stroke_width: 0.0,
        }
    }

    /// Outline in layer-local space for a box of the given size.
    pub fn path(&self, width: f64, height: f64) -> BezPath {
        let rect = Rect::new(0.0, 0.0, width, height);
        match self.shape {
            ShapeKind::Rectangle => rect.to_path(0.1),
            ShapeKind::Circle => Ellipse::from_rect(rect).to_path(0.1),
        }
    }

    pub(crate) fn apply_patch(&mut self, patch: &ShapePatch) {
        if let Some(shape) = patch.shape {
            self.shape = shape;
        }
        if let Some(fill) = patch.fill_color {
            self.fill_color = fill;
        }
        if let Some(stroke) = patch.stroke_color {
            self.stroke_color = stroke;
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width.max(0.0);
        }
    }
}

/// Partial update for a shape layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapePatch {
    pub shape: Option<ShapeKind>,
    pub fill_color: Option<RgbaColor>,
    pub stroke_color: Option<RgbaColor>,
    pub stroke_width: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_path_stays_in_box() {
        let shape = ShapeLayer::new(ShapeKind::Circle);
        let bbox = shape.path(80.0, 40.0).bounding_box();
        assert!(bbox.x0 >= -1e-6 && bbox.x1 <= 80.0 + 1e-6);
        assert!(bbox.y0 >= -1e-6 && bbox.y1 <= 40.0 + 1e-6);
    }

    #[test]
    fn test_stroke_width_never_negative() {
        let mut shape = ShapeLayer::new(ShapeKind::Rectangle);
        shape.apply_patch(&ShapePatch {
            stroke_width: Some(-3.0),
            ..ShapePatch::default()
        });
        assert_eq!(shape.stroke_width, 0.0);
    }
}
