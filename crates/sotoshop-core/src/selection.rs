//! Selection handles and the transform math behind canvas gestures.

use crate::layers::{Layer, LayerPatch};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle, scales both axes.
    Corner(Corner),
    /// Edge midpoint handle, scales one axis.
    Edge(Edge),
    /// Rotation handle above the top edge.
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl HandleKind {
    /// Direction of the handle from the layer center in layer-local axes,
    /// each component -1, 0 or 1.
    pub fn signs(self) -> (f64, f64) {
        match self {
            HandleKind::Corner(Corner::TopLeft) => (-1.0, -1.0),
            HandleKind::Corner(Corner::TopRight) => (1.0, -1.0),
            HandleKind::Corner(Corner::BottomLeft) => (-1.0, 1.0),
            HandleKind::Corner(Corner::BottomRight) => (1.0, 1.0),
            HandleKind::Edge(Edge::Top) => (0.0, -1.0),
            HandleKind::Edge(Edge::Right) => (1.0, 0.0),
            HandleKind::Edge(Edge::Bottom) => (0.0, 1.0),
            HandleKind::Edge(Edge::Left) => (-1.0, 0.0),
            HandleKind::Rotate => (0.0, -1.0),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in document coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a document point hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

const SCALE_HANDLES: [HandleKind; 8] = [
    HandleKind::Corner(Corner::TopLeft),
    HandleKind::Corner(Corner::TopRight),
    HandleKind::Corner(Corner::BottomLeft),
    HandleKind::Corner(Corner::BottomRight),
    HandleKind::Edge(Edge::Top),
    HandleKind::Edge(Edge::Right),
    HandleKind::Edge(Edge::Bottom),
    HandleKind::Edge(Edge::Left),
];

/// Handles on the rotated layer box: corners, rotation, then edges.
///
/// `rotate_offset` is the distance of the rotate handle above the top edge in
/// document units.
pub fn handles_for(layer: &Layer, rotate_offset: f64) -> Vec<Handle> {
    let transform = layer.transform();
    let (w, h) = (layer.width, layer.height);
    let local = |sx: f64, sy: f64| Point::new((sx + 1.0) / 2.0 * w, (sy + 1.0) / 2.0 * h);

    let mut handles: Vec<Handle> = SCALE_HANDLES[..4]
        .iter()
        .map(|&kind| {
            let (sx, sy) = kind.signs();
            Handle::new(transform * local(sx, sy), kind)
        })
        .collect();
    handles.push(Handle::new(
        transform * Point::new(w / 2.0, -rotate_offset),
        HandleKind::Rotate,
    ));
    handles.extend(SCALE_HANDLES[4..].iter().map(|&kind| {
        let (sx, sy) = kind.signs();
        Handle::new(transform * local(sx, sy), kind)
    }));
    handles
}

/// Find which handle (if any) is hit at the given document point.
pub fn hit_test_handles(
    layer: &Layer,
    point: Point,
    tolerance: f64,
    rotate_offset: f64,
) -> Option<HandleKind> {
    handles_for(layer, rotate_offset)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// Translate `original` by a document-space delta.
pub fn apply_move(original: &Layer, delta: Vec2) -> LayerPatch {
    LayerPatch::position(original.x + delta.x, original.y + delta.y)
}

/// Resize `original` by dragging `handle` from `start` to `current` (document space).
///
/// The opposite corner or edge stays fixed. With `keep_aspect`, corner drags
/// derive the height from the width using the original aspect ratio. Sizes
/// never drop below `min_size`.
pub fn apply_scale(
    original: &Layer,
    handle: HandleKind,
    start: Point,
    current: Point,
    keep_aspect: bool,
    min_size: f64,
) -> LayerPatch {
    let (hx, hy) = handle.signs();
    if handle == HandleKind::Rotate {
        return LayerPatch::transform_of(original);
    }
    let min_size = min_size.max(1.0);
    let rotate = Affine::rotate(original.rotation.to_radians());
    let delta = rotate.inverse() * (current - start).to_point();

    let (w0, h0) = (original.width.max(min_size), original.height.max(min_size));
    let mut width = if hx != 0.0 {
        (w0 + hx * delta.x).max(min_size)
    } else {
        w0
    };
    let mut height = if hy != 0.0 {
        (h0 + hy * delta.y).max(min_size)
    } else {
        h0
    };

    if keep_aspect && matches!(handle, HandleKind::Corner(_)) {
        let aspect = w0 / h0;
        height = width / aspect;
        if height < min_size {
            height = min_size;
            width = height * aspect;
        }
    }

    // Pivot is the opposite handle; it keeps its document position.
    let (px, py) = (-hx, -hy);
    let pivot = original.center() + (rotate * Point::new(px * w0 / 2.0, py * h0 / 2.0)).to_vec2();
    let center = pivot - (rotate * Point::new(px * width / 2.0, py * height / 2.0)).to_vec2();

    LayerPatch {
        x: Some(center.x - width / 2.0),
        y: Some(center.y - height / 2.0),
        width: Some(width),
        height: Some(height),
        rotation: Some(original.rotation),
        ..LayerPatch::default()
    }
}

/// Rotation in degrees after dragging from `start` to `current` around `pivot`.
///
/// The result tracks the pointer relative to where the drag began. With
/// `snap_degrees`, the angle snaps to multiples of that step.
pub fn apply_rotation(
    original_rotation: f64,
    pivot: Point,
    start: Point,
    current: Point,
    snap_degrees: Option<f64>,
) -> f64 {
    let angle_of = |p: Point| (p.y - pivot.y).atan2(p.x - pivot.x);
    if (current - pivot).hypot2() < f64::EPSILON || (start - pivot).hypot2() < f64::EPSILON {
        return original_rotation;
    }
    let mut rotation = original_rotation + (angle_of(current) - angle_of(start)).to_degrees();
    if let Some(step) = snap_degrees.filter(|s| *s > 0.0) {
        rotation = (rotation / step).round() * step;
    }
    normalize_degrees(rotation)
}

/// Scale `original` about its center by `ratio` and rotate it by `angle_delta` degrees.
pub fn apply_pinch(original: &Layer, ratio: f64, angle_delta: f64, min_size: f64) -> LayerPatch {
    let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    let min_size = min_size.max(1.0);
    let width = (original.width * ratio).max(min_size);
    let height = (original.height * ratio).max(min_size);
    let center = original.center();
    LayerPatch {
        x: Some(center.x - width / 2.0),
        y: Some(center.y - height / 2.0),
        width: Some(width),
        height: Some(height),
        rotation: Some(normalize_degrees(original.rotation + angle_delta)),
        ..LayerPatch::default()
    }
}

/// Wrap an angle into `[0, 360)`.
fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if (wrapped - 360.0).abs() < 1e-9 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{NewLayer, ShapeKind};
    use uuid::Uuid;

    fn layer(x: f64, y: f64, w: f64, h: f64) -> Layer {
        Layer::from_new(
            Uuid::new_v4(),
            NewLayer::shape(ShapeKind::Rectangle).at(x, y).sized(w, h),
        )
    }

    fn patched(original: &Layer, patch: &LayerPatch) -> Layer {
        let mut layer = original.clone();
        layer.apply_patch(patch);
        layer
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_handles_layout() {
        let l = layer(0.0, 0.0, 100.0, 50.0);
        let handles = handles_for(&l, 25.0);
        assert_eq!(handles.len(), 9);
        assert_eq!(handles[0].kind, HandleKind::Corner(Corner::TopLeft));
        assert_eq!(handles[0].position, Point::new(0.0, 0.0));
        assert_eq!(handles[3].position, Point::new(100.0, 50.0));
        assert_eq!(handles[4].kind, HandleKind::Rotate);
        assert_close(handles[4].position.x, 50.0);
        assert_close(handles[4].position.y, -25.0);
    }

    #[test]
    fn test_handle_hit_test() {
        let l = layer(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            hit_test_handles(&l, Point::new(98.0, 101.0), 5.0, 25.0),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
        assert_eq!(
            hit_test_handles(&l, Point::new(100.0, 50.0), 5.0, 25.0),
            Some(HandleKind::Edge(Edge::Right))
        );
        assert_eq!(hit_test_handles(&l, Point::new(50.0, 50.0), 5.0, 25.0), None);
    }

    #[test]
    fn test_rotated_handles_follow_layer() {
        let mut l = layer(0.0, 0.0, 100.0, 100.0);
        l.rotation = 90.0;
        // Top-left corner of a square rotated 90° clockwise lands at top-right.
        let handles = handles_for(&l, 25.0);
        assert_close(handles[0].position.x, 100.0);
        assert_close(handles[0].position.y, 0.0);
    }

    #[test]
    fn test_move() {
        let l = layer(10.0, 20.0, 50.0, 50.0);
        let moved = patched(&l, &apply_move(&l, Vec2::new(50.0, 50.0)));
        assert_close(moved.x, 60.0);
        assert_close(moved.y, 70.0);
    }

    #[test]
    fn test_corner_scale_keeps_opposite_corner() {
        let l = layer(0.0, 0.0, 100.0, 100.0);
        let patch = apply_scale(
            &l,
            HandleKind::Corner(Corner::TopLeft),
            Point::new(0.0, 0.0),
            Point::new(-50.0, -20.0),
            false,
            1.0,
        );
        let scaled = patched(&l, &patch);
        assert_close(scaled.width, 150.0);
        assert_close(scaled.height, 120.0);
        assert_close(scaled.x + scaled.width, 100.0);
        assert_close(scaled.y + scaled.height, 100.0);
    }

    #[test]
    fn test_edge_scale_single_axis() {
        let l = layer(0.0, 0.0, 100.0, 100.0);
        let patch = apply_scale(
            &l,
            HandleKind::Edge(Edge::Right),
            Point::new(100.0, 50.0),
            Point::new(130.0, 90.0),
            false,
            1.0,
        );
        let scaled = patched(&l, &patch);
        assert_close(scaled.width, 130.0);
        assert_close(scaled.height, 100.0);
        assert_close(scaled.x, 0.0);
        assert_close(scaled.y, 0.0);
    }

    #[test]
    fn test_rotated_scale_keeps_pivot() {
        let mut l = layer(0.0, 0.0, 100.0, 50.0);
        l.rotation = 30.0;
        let handles = handles_for(&l, 25.0);
        let pivot_before = handles[0].position;
        let start = handles[3].position;
        let patch = apply_scale(
            &l,
            HandleKind::Corner(Corner::BottomRight),
            start,
            start + Vec2::new(40.0, 10.0),
            false,
            1.0,
        );
        let scaled = patched(&l, &patch);
        let pivot_after = handles_for(&scaled, 25.0)[0].position;
        assert!((pivot_after - pivot_before).hypot() < 1e-9);
    }

    #[test]
    fn test_aspect_locked_scale() {
        let l = layer(0.0, 0.0, 200.0, 100.0);
        let patch = apply_scale(
            &l,
            HandleKind::Corner(Corner::BottomRight),
            Point::new(200.0, 100.0),
            Point::new(300.0, 110.0),
            true,
            1.0,
        );
        let scaled = patched(&l, &patch);
        assert_close(scaled.width, 300.0);
        assert_close(scaled.height, 150.0);
    }

    #[test]
    fn test_scale_clamps_to_minimum() {
        let l = layer(0.0, 0.0, 100.0, 100.0);
        let patch = apply_scale(
            &l,
            HandleKind::Corner(Corner::BottomRight),
            Point::new(100.0, 100.0),
            Point::new(-500.0, -500.0),
            false,
            1.0,
        );
        let scaled = patched(&l, &patch);
        assert_close(scaled.width, 1.0);
        assert_close(scaled.height, 1.0);
        assert!(scaled.x.is_finite() && scaled.y.is_finite());
    }

    #[test]
    fn test_zero_sized_original_does_not_produce_nan() {
        let l = layer(0.0, 0.0, 0.0, 0.0);
        let patch = apply_scale(
            &l,
            HandleKind::Corner(Corner::BottomRight),
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            true,
            1.0,
        );
        let scaled = patched(&l, &patch);
        assert!(scaled.width.is_finite() && scaled.width >= 1.0);
        assert!(scaled.height.is_finite() && scaled.height >= 1.0);
    }

    #[test]
    fn test_rotation_tracks_pointer() {
        let pivot = Point::new(50.0, 50.0);
        let rotation = apply_rotation(
            10.0,
            pivot,
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
            None,
        );
        assert_close(rotation, 100.0);
    }

    #[test]
    fn test_rotation_snap() {
        let pivot = Point::new(0.0, 0.0);
        let angle = 20.0_f64.to_radians();
        let rotation = apply_rotation(
            0.0,
            pivot,
            Point::new(10.0, 0.0),
            Point::new(10.0 * angle.cos(), 10.0 * angle.sin()),
            Some(15.0),
        );
        assert_close(rotation, 15.0);
    }

    #[test]
    fn test_negative_rotation_wraps() {
        let pivot = Point::new(0.0, 0.0);
        let rotation = apply_rotation(
            0.0,
            pivot,
            Point::new(10.0, 0.0),
            Point::new(0.0, -10.0),
            None,
        );
        assert_close(rotation, 270.0);
    }

    #[test]
    fn test_pinch_scales_about_center() {
        let l = layer(0.0, 0.0, 100.0, 50.0);
        let pinched = patched(&l, &apply_pinch(&l, 2.0, 45.0, 1.0));
        assert_close(pinched.width, 200.0);
        assert_close(pinched.height, 100.0);
        assert_close(pinched.center().x, 50.0);
        assert_close(pinched.center().y, 25.0);
        assert_close(pinched.rotation, 45.0);
    }
}
