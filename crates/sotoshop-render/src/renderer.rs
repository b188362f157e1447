//! Paint surface abstraction and the document render loop.

use kurbo::{Affine, BezPath, Rect, Shape};
use peniko::{BlendMode as PenikoBlend, Color, Compose, ImageData, Mix};
use sotoshop_core::layers::{ImageLayer, LayerKind, ShapeLayer, TextLayer};
use sotoshop_core::selection::{HANDLE_SIZE, handles_for};
use sotoshop_core::{
    BlendMode, CanvasDocument, Editor, HandleKind, Layer, LayerId, RgbaColor, Viewport,
};
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;
use std::sync::Arc;

use crate::filters::apply_filters;
use crate::text::TextEngine;

/// Nested groups used to feather a blurred shadow.
const SHADOW_STEPS: usize = 4;

/// A positioned glyph in layout space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// A run of glyphs sharing one font, ready to paint.
#[derive(Clone)]
pub struct GlyphRun {
    pub font: parley::FontData,
    pub font_size: f32,
    pub normalized_coords: Vec<i16>,
    /// Synthetic skew for fake italics.
    pub glyph_transform: Option<Affine>,
    pub glyphs: Vec<Glyph>,
}

/// Backend seam for painting a document.
///
/// Every call carries the full transform from layer-local space to the
/// surface. Groups opened with [`PaintSurface::push_layer`] composite with
/// their blend mode and alpha when popped.
pub trait PaintSurface {
    fn fill_rect(&mut self, transform: Affine, rect: Rect, color: Color);
    fn fill_path(&mut self, transform: Affine, path: &BezPath, color: Color);
    fn stroke_path(&mut self, transform: Affine, path: &BezPath, width: f64, color: Color);
    /// Draw `image` with its top-left pixel at the origin of `transform`.
    fn draw_image(&mut self, transform: Affine, image: &ImageData);
    fn draw_glyphs(&mut self, transform: Affine, run: &GlyphRun, color: Color);

    /// Fill `outline` as a shadow softened over `blur` pixels.
    ///
    /// Coverage falls off linearly from the outline to `blur / 2` beyond it,
    /// built from nested groups that each fill a grown copy of the outline.
    fn draw_shadow(&mut self, transform: Affine, outline: &BezPath, blur: f64, color: Color) {
        if blur <= 0.0 {
            self.fill_path(transform, outline, color);
            return;
        }
        let alpha = color.components[3];
        let opaque = color.with_alpha(1.0);
        let clip = outline.bounding_box().inflate(blur, blur);
        let steps = SHADOW_STEPS as f32;
        // Outermost first; the region inside `j` groups ends at alpha * j / steps.
        for j in 1..=SHADOW_STEPS {
            let covered = alpha * (j - 1) as f32 / steps;
            let step_alpha = (alpha / steps) / (1.0 - covered);
            let grow = blur / 2.0 * (SHADOW_STEPS - j) as f64 / (SHADOW_STEPS - 1) as f64;
            self.push_layer(transform, clip, PenikoBlend::new(Mix::Normal, Compose::SrcOver), step_alpha);
            self.fill_path(transform, outline, opaque);
            if grow > 0.0 {
                self.stroke_path(transform, outline, grow * 2.0, opaque);
            }
            self.pop_layer();
        }
    }

    fn push_layer(&mut self, transform: Affine, clip: Rect, blend: PenikoBlend, alpha: f32);
    fn pop_layer(&mut self);
}

/// Map a layer blend mode onto the compositor's mix.
pub fn peniko_blend(mode: BlendMode) -> PenikoBlend {
    let mix = match mode {
        BlendMode::Normal => Mix::Normal,
        BlendMode::Multiply => Mix::Multiply,
        BlendMode::Screen => Mix::Screen,
        BlendMode::Overlay => Mix::Overlay,
        BlendMode::Darken => Mix::Darken,
        BlendMode::Lighten => Mix::Lighten,
        BlendMode::ColorDodge => Mix::ColorDodge,
        BlendMode::ColorBurn => Mix::ColorBurn,
        BlendMode::HardLight => Mix::HardLight,
        BlendMode::SoftLight => Mix::SoftLight,
        BlendMode::Difference => Mix::Difference,
        BlendMode::Exclusion => Mix::Exclusion,
        BlendMode::Hue => Mix::Hue,
        BlendMode::Saturation => Mix::Saturation,
        BlendMode::Color => Mix::Color,
        BlendMode::Luminosity => Mix::Luminosity,
    };
    PenikoBlend::new(mix, Compose::SrcOver)
}

/// Everything the painter needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub document: &'a CanvasDocument,
    /// Document-to-surface transform.
    pub transform: Affine,
    /// Viewport zoom, used to keep handles a constant screen size.
    pub zoom: f64,
    pub selection: Option<LayerId>,
    pub selection_color: Color,
    /// Rotate handle distance above the top edge, in screen pixels.
    pub rotate_handle_offset: f64,
}

impl<'a> RenderContext<'a> {
    /// Identity transform, no selection.
    pub fn new(document: &'a CanvasDocument) -> Self {
        Self {
            document,
            transform: Affine::IDENTITY,
            zoom: 1.0,
            selection: None,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            rotate_handle_offset: 25.0,
        }
    }

    /// Frame for the editor's current document, viewport and selection.
    pub fn for_editor(editor: &'a Editor) -> Self {
        let config = editor.config();
        Self::new(editor.document())
            .with_viewport(&editor.viewport)
            .with_selection(editor.selected_id())
            .with_selection_color(config.selection_color)
            .with_rotate_handle_offset(config.rotate_handle_offset)
    }

    pub fn with_viewport(mut self, viewport: &Viewport) -> Self {
        self.transform = viewport.transform();
        self.zoom = viewport.zoom;
        self
    }

    pub fn with_selection(mut self, selection: Option<LayerId>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_selection_color(mut self, color: RgbaColor) -> Self {
        self.selection_color = color.into();
        self
    }

    pub fn with_rotate_handle_offset(mut self, offset: f64) -> Self {
        self.rotate_handle_offset = offset;
        self
    }
}

#[derive(Clone, PartialEq)]
struct FilterKey {
    pixels: usize,
    brightness: u64,
    contrast: u64,
    saturate: u64,
    grayscale: u64,
}

impl FilterKey {
    fn of(image: &ImageLayer) -> Self {
        let filters = &image.filters;
        Self {
            pixels: Arc::as_ptr(&image.image.shared_pixels()) as usize,
            brightness: filters.brightness.to_bits(),
            contrast: filters.contrast.to_bits(),
            saturate: filters.saturate.to_bits(),
            grayscale: filters.grayscale.to_bits(),
        }
    }
}

/// Projects a [`CanvasDocument`] onto a [`PaintSurface`].
///
/// Holds render-only caches; painting never mutates the document.
pub struct DocumentPainter {
    text: TextEngine,
    image_cache: HashMap<LayerId, (FilterKey, ImageData)>,
}

impl Default for DocumentPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentPainter {
    pub fn new() -> Self {
        Self {
            text: TextEngine::new(),
            image_cache: HashMap::new(),
        }
    }

    /// Paint one frame: background, visible layers bottom to top, then the
    /// selection overlay.
    pub fn paint(&mut self, ctx: &RenderContext, surface: &mut impl PaintSurface) {
        let doc = ctx.document;
        let bounds = doc.bounds();
        surface.fill_rect(ctx.transform, bounds, doc.background_color.into());

        self.image_cache
            .retain(|id, _| doc.layers.iter().any(|layer| layer.id() == *id));

        for layer in doc.layers.iter().filter(|layer| layer.is_visible) {
            self.paint_layer(ctx, layer, bounds, surface);
        }

        if let Some(layer) = ctx
            .selection
            .and_then(|id| doc.layer(id))
            .filter(|layer| layer.is_visible)
        {
            self.paint_selection(ctx, layer, surface);
        }
    }

    fn paint_layer(
        &mut self,
        ctx: &RenderContext,
        layer: &Layer,
        clip: Rect,
        surface: &mut impl PaintSurface,
    ) {
        let transform = ctx.transform * layer.transform();
        // The shadow is part of the layer group.
        surface.push_layer(ctx.transform, clip, peniko_blend(layer.blend_mode), layer.alpha());
        match &layer.kind {
            LayerKind::Text(text) => {
                if !text.content.is_empty() {
                    let runs = self.text.layout(text, layer.width);
                    paint_shadow(ctx, layer, &runs, surface);
                    paint_text(transform, layer, text, &runs, surface);
                }
            }
            LayerKind::Image(image) => {
                paint_shadow(ctx, layer, &[], surface);
                self.paint_image(transform, layer, image, surface);
            }
            LayerKind::Shape(shape) => {
                paint_shadow(ctx, layer, &[], surface);
                paint_shape(transform, layer, shape, surface);
            }
        }
        surface.pop_layer();
    }

    fn paint_image(
        &mut self,
        transform: Affine,
        layer: &Layer,
        image: &ImageLayer,
        surface: &mut impl PaintSurface,
    ) {
        let bitmap = &image.image;
        let key = FilterKey::of(image);
        let data = match self.image_cache.get(&layer.id()) {
            Some((cached, data)) if *cached == key => data.clone(),
            _ => {
                let pixels = if image.filters.is_identity() {
                    bitmap.shared_pixels()
                } else {
                    Arc::new(apply_filters(bitmap.pixels(), &image.filters))
                };
                let data = ImageData {
                    data: peniko::Blob::new(pixels),
                    format: peniko::ImageFormat::Rgba8,
                    width: bitmap.width(),
                    height: bitmap.height(),
                    alpha_type: peniko::ImageAlphaType::Alpha,
                };
                self.image_cache.insert(layer.id(), (key, data.clone()));
                data
            }
        };

        let scale = Affine::scale_non_uniform(
            layer.width / f64::from(bitmap.width()),
            layer.height / f64::from(bitmap.height()),
        );
        surface.draw_image(transform * scale, &data);
    }

    fn paint_selection(&self, ctx: &RenderContext, layer: &Layer, surface: &mut impl PaintSurface) {
        let zoom = ctx.zoom.max(f64::EPSILON);
        let stroke_width = 1.5 / zoom;
        let color = ctx.selection_color;

        let outline = Rect::new(0.0, 0.0, layer.width, layer.height).to_path(0.1);
        surface.stroke_path(ctx.transform * layer.transform(), &outline, stroke_width, color);

        let handles = handles_for(layer, ctx.rotate_handle_offset / zoom);
        let half = HANDLE_SIZE / zoom / 2.0;

        // Stem from the top edge to the rotate handle.
        let top_mid = layer.transform() * kurbo::Point::new(layer.width / 2.0, 0.0);
        if let Some(rotate) = handles
            .iter()
            .find(|h| h.kind == HandleKind::Rotate)
        {
            let mut stem = BezPath::new();
            stem.move_to(top_mid);
            stem.line_to(rotate.position);
            surface.stroke_path(ctx.transform, &stem, stroke_width, color);
        }

        for handle in &handles {
            let square = Rect::from_center_size(handle.position, (half * 2.0, half * 2.0));
            let path = if handle.kind == HandleKind::Rotate {
                kurbo::Circle::new(handle.position, half).to_path(0.1)
            } else {
                square.to_path(0.1)
            };
            surface.fill_path(ctx.transform, &path, Color::WHITE);
            surface.stroke_path(ctx.transform, &path, stroke_width, color);
        }
    }
}

fn paint_text(
    transform: Affine,
    layer: &Layer,
    text: &TextLayer,
    runs: &[GlyphRun],
    surface: &mut impl PaintSurface,
) {
    if runs.is_empty() {
        log::debug!("no glyphs for font {:?}, drawing placeholder", text.font);
        surface.fill_rect(transform, placeholder(layer, text), text.color.with_alpha_factor(0.2).into());
        return;
    }
    let color: Color = text.color.into();
    for run in runs {
        surface.draw_glyphs(transform, run, color);
    }
}

fn placeholder(layer: &Layer, text: &TextLayer) -> Rect {
    Rect::new(0.0, 0.0, layer.width, layer.height.min(text.size))
}

fn paint_shape(transform: Affine, layer: &Layer, shape: &ShapeLayer, surface: &mut impl PaintSurface) {
    let path = shape.path(layer.width, layer.height);
    if shape.fill_color.is_visible() {
        surface.fill_path(transform, &path, shape.fill_color.into());
    }
    if shape.stroke_width > 0.0 && shape.stroke_color.is_visible() {
        surface.stroke_path(transform, &path, shape.stroke_width, shape.stroke_color.into());
    }
}

/// Paint the layer's drop shadow following its content: the shape outline,
/// the laid-out glyphs, or the frame for images.
fn paint_shadow(ctx: &RenderContext, layer: &Layer, runs: &[GlyphRun], surface: &mut impl PaintSurface) {
    let shadow = &layer.shadow;
    if !shadow.is_visible() {
        return;
    }
    let transform = ctx.transform * Affine::translate(shadow.offset()) * layer.transform();
    let color: Color = shadow.color.into();
    let outline = match &layer.kind {
        LayerKind::Text(_) if !runs.is_empty() => {
            paint_glyph_shadow(transform, layer, runs, shadow.blur, color, surface);
            return;
        }
        LayerKind::Text(text) => placeholder(layer, text).to_path(0.1),
        LayerKind::Shape(shape) => shape.path(layer.width, layer.height),
        LayerKind::Image(_) => Rect::new(0.0, 0.0, layer.width, layer.height).to_path(0.1),
    };
    surface.draw_shadow(transform, &outline, shadow.blur, color);
}

/// Glyph shadow; a blur spreads copies of the glyphs around a circle of
/// radius `blur / 2` inside one group.
fn paint_glyph_shadow(
    transform: Affine,
    layer: &Layer,
    runs: &[GlyphRun],
    blur: f64,
    color: Color,
    surface: &mut impl PaintSurface,
) {
    if blur <= 0.0 {
        for run in runs {
            surface.draw_glyphs(transform, run, color);
        }
        return;
    }
    let bottom = runs
        .iter()
        .flat_map(|run| run.glyphs.iter().map(move |g| f64::from(g.y + run.font_size)))
        .fold(layer.height, f64::max);
    let clip = Rect::new(-blur, -blur, layer.width + blur, bottom + blur);
    let opaque = color.with_alpha(1.0);
    let radius = blur / 2.0;

    surface.push_layer(
        transform,
        clip,
        PenikoBlend::new(Mix::Normal, Compose::SrcOver),
        color.components[3],
    );
    let spread = (0..8).map(|k| {
        let (sin, cos) = (f64::from(k) * FRAC_PI_4).sin_cos();
        Affine::translate((radius * cos, radius * sin))
    });
    for offset in std::iter::once(Affine::IDENTITY).chain(spread) {
        for run in runs {
            surface.draw_glyphs(transform * offset, run, opaque);
        }
    }
    surface.pop_layer();
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sotoshop_core::layers::{ImageFilters, ImagePatch, ShapeKind};
    use sotoshop_core::{Bitmap, LayerPatch, NewLayer};

    /// Paint command log for asserting draw order.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Op {
        FillRect(Rect, Color),
        FillPath(Color),
        StrokePath(Color),
        Image(u32, u32),
        Glyphs(usize),
        Shadow(Color),
        Push(PenikoBlend, f32),
        Pop,
    }

    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) ops: Vec<Op>,
    }

    impl PaintSurface for RecordingSurface {
        fn fill_rect(&mut self, _transform: Affine, rect: Rect, color: Color) {
            self.ops.push(Op::FillRect(rect, color));
        }
        fn fill_path(&mut self, _transform: Affine, _path: &BezPath, color: Color) {
            self.ops.push(Op::FillPath(color));
        }
        fn stroke_path(&mut self, _transform: Affine, _path: &BezPath, _width: f64, color: Color) {
            self.ops.push(Op::StrokePath(color));
        }
        fn draw_image(&mut self, _transform: Affine, image: &ImageData) {
            self.ops.push(Op::Image(image.width, image.height));
        }
        fn draw_glyphs(&mut self, _transform: Affine, run: &GlyphRun, _color: Color) {
            self.ops.push(Op::Glyphs(run.glyphs.len()));
        }
        fn draw_shadow(&mut self, _transform: Affine, _outline: &BezPath, _blur: f64, color: Color) {
            self.ops.push(Op::Shadow(color));
        }
        fn push_layer(&mut self, _transform: Affine, _clip: Rect, blend: PenikoBlend, alpha: f32) {
            self.ops.push(Op::Push(blend, alpha));
        }
        fn pop_layer(&mut self) {
            self.ops.push(Op::Pop);
        }
    }

    fn shape(color: RgbaColor) -> NewLayer {
        let mut new = NewLayer::shape(ShapeKind::Rectangle).sized(100.0, 100.0);
        if let sotoshop_core::LayerKind::Shape(shape) = &mut new.kind {
            shape.fill_color = color;
        }
        new
    }

    fn fill_colors(ops: &[Op]) -> Vec<Color> {
        ops.iter()
            .filter_map(|op| match op {
                Op::FillPath(color) => Some(*color),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paint_order_follows_storage_order() {
        let red = RgbaColor::rgb(255, 0, 0);
        let green = RgbaColor::rgb(0, 255, 0);
        let blue = RgbaColor::rgb(0, 0, 255);
        let mut editor = Editor::default();
        editor.add_layer(shape(red).named("A"));
        editor.add_layer(shape(green).named("B"));
        editor.add_layer(shape(blue).named("C"));
        editor.clear_selection();

        let mut layers = editor.document().layers.clone();
        let c = layers.remove(2);
        layers.insert(0, c);
        assert!(editor.reorder_layers(layers));

        let mut painter = DocumentPainter::new();
        let mut surface = RecordingSurface::default();
        painter.paint(&RenderContext::for_editor(&editor), &mut surface);

        assert_eq!(
            fill_colors(&surface.ops),
            vec![blue.into(), red.into(), green.into()]
        );
        let background: Color = RgbaColor::white().into();
        assert_eq!(
            surface.ops[0],
            Op::FillRect(editor.document().bounds(), background)
        );
    }

    #[test]
    fn test_invisible_layers_are_skipped() {
        let mut editor = Editor::default();
        let a = editor.add_layer(shape(RgbaColor::rgb(255, 0, 0)));
        editor.add_layer(shape(RgbaColor::rgb(0, 0, 255)));
        editor.clear_selection();
        let patch = LayerPatch {
            is_visible: Some(false),
            ..LayerPatch::default()
        };
        editor.update_layer(a, &patch, true);

        let mut surface = RecordingSurface::default();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        assert_eq!(fill_colors(&surface.ops), vec![RgbaColor::rgb(0, 0, 255).into()]);
        let pushes = surface.ops.iter().filter(|op| matches!(op, Op::Push(..))).count();
        assert_eq!(pushes, 1);
    }

    #[test]
    fn test_group_carries_blend_and_opacity() {
        let mut editor = Editor::default();
        let id = editor.add_layer(shape(RgbaColor::black()));
        editor.clear_selection();
        let patch = LayerPatch {
            opacity: Some(40.0),
            blend_mode: Some(BlendMode::Multiply),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true);

        let mut surface = RecordingSurface::default();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        let push = surface
            .ops
            .iter()
            .find_map(|op| match op {
                Op::Push(blend, alpha) => Some((*blend, *alpha)),
                _ => None,
            })
            .unwrap();
        assert_eq!(push.0, PenikoBlend::new(Mix::Multiply, Compose::SrcOver));
        assert!((push.1 - 0.4).abs() < 1e-6);
        assert_eq!(surface.ops.last(), Some(&Op::Pop));
    }

    #[test]
    fn test_shadow_painted_inside_layer_group() {
        let mut editor = Editor::default();
        let id = editor.add_layer(shape(RgbaColor::white()));
        editor.clear_selection();
        let shadow_color = RgbaColor::new(0, 0, 0, 128);
        let patch = LayerPatch {
            shadow: Some(sotoshop_core::layers::Shadow {
                offset_x: 4.0,
                offset_y: 4.0,
                blur: 8.0,
                color: shadow_color,
            }),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true);

        let mut surface = RecordingSurface::default();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        assert!(matches!(surface.ops[1], Op::Push(..)));
        assert_eq!(surface.ops[2], Op::Shadow(shadow_color.into()));
        assert_eq!(surface.ops[3], Op::FillPath(RgbaColor::white().into()));
    }

    #[test]
    fn test_hidden_selected_layer_has_no_overlay() {
        let mut editor = Editor::default();
        let id = editor.add_layer(shape(RgbaColor::black()));
        let patch = LayerPatch {
            is_visible: Some(false),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true);
        assert_eq!(editor.selected_id(), Some(id));

        let mut surface = RecordingSurface::default();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        assert_eq!(surface.ops.len(), 1);
        assert!(!surface.ops.iter().any(|op| matches!(op, Op::StrokePath(_))));
    }

    #[test]
    fn test_selection_overlay_painted_last_outside_groups() {
        let mut editor = Editor::default();
        editor.add_layer(shape(RgbaColor::black()));
        let selection: Color = editor.config().selection_color.into();

        let mut surface = RecordingSurface::default();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        let last_pop = surface
            .ops
            .iter()
            .rposition(|op| *op == Op::Pop)
            .unwrap();
        let overlay = &surface.ops[last_pop + 1..];
        // Outline, stem, then fill and stroke for each of the nine handles.
        assert_eq!(overlay.len(), 2 + 9 * 2);
        assert_eq!(overlay[0], Op::StrokePath(selection));
        assert!(!overlay.iter().any(|op| matches!(op, Op::Push(..))));
    }

    #[test]
    fn test_image_layer_uses_filtered_cache() {
        let mut editor = Editor::default();
        let id = editor.add_decoded_image(Bitmap::solid(4, 2, [200, 100, 50, 255]), "solid.png");
        editor.clear_selection();

        let mut painter = DocumentPainter::new();
        let mut surface = RecordingSurface::default();
        painter.paint(&RenderContext::for_editor(&editor), &mut surface);
        assert!(surface.ops.contains(&Op::Image(4, 2)));
        let first = painter.image_cache.get(&id).unwrap().1.data.clone();

        let patch = LayerPatch {
            image: Some(ImagePatch {
                filters: Some(ImageFilters {
                    grayscale: 100.0,
                    ..ImageFilters::default()
                }),
                original_src: None,
            }),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true);
        painter.paint(&RenderContext::for_editor(&editor), &mut RecordingSurface::default());
        let second = &painter.image_cache.get(&id).unwrap().1.data;
        assert_ne!(first.data(), second.data());

        editor.delete_layer(id);
        painter.paint(&RenderContext::for_editor(&editor), &mut RecordingSurface::default());
        assert!(painter.image_cache.is_empty());
    }

    #[test]
    fn test_blend_mapping_is_total() {
        for mode in BlendMode::all() {
            assert_eq!(peniko_blend(*mode).compose, Compose::SrcOver);
        }
        assert_eq!(peniko_blend(BlendMode::Normal).mix, Mix::Normal);
        assert_eq!(peniko_blend(BlendMode::Luminosity).mix, Mix::Luminosity);
    }
}
