//! On-screen painting into a Vello scene.

use kurbo::{Affine, BezPath, Rect, Stroke};
use peniko::{BlendMode, Brush, Color, Fill, ImageData};
use vello::Scene;

use crate::renderer::{GlyphRun, PaintSurface};

/// [`PaintSurface`] that records into a [`vello::Scene`].
#[derive(Default)]
pub struct SceneSurface {
    scene: Scene,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Clear for the next frame.
    pub fn reset(&mut self) {
        self.scene.reset();
    }
}

impl PaintSurface for SceneSurface {
    fn fill_rect(&mut self, transform: Affine, rect: Rect, color: Color) {
        self.scene.fill(Fill::NonZero, transform, color, None, &rect);
    }

    fn fill_path(&mut self, transform: Affine, path: &BezPath, color: Color) {
        self.scene.fill(Fill::NonZero, transform, color, None, path);
    }

    fn stroke_path(&mut self, transform: Affine, path: &BezPath, width: f64, color: Color) {
        self.scene
            .stroke(&Stroke::new(width), transform, color, None, path);
    }

    fn draw_image(&mut self, transform: Affine, image: &ImageData) {
        self.scene.draw_image(&image.clone().into(), transform);
    }

    fn draw_glyphs(&mut self, transform: Affine, run: &GlyphRun, color: Color) {
        let brush = Brush::Solid(color);
        self.scene
            .draw_glyphs(&run.font)
            .brush(&brush)
            .hint(true)
            .transform(transform)
            .glyph_transform(run.glyph_transform)
            .font_size(run.font_size)
            .normalized_coords(&run.normalized_coords)
            .draw(
                Fill::NonZero,
                run.glyphs.iter().map(|glyph| vello::Glyph {
                    id: glyph.id,
                    x: glyph.x,
                    y: glyph.y,
                }),
            );
    }

    fn push_layer(&mut self, transform: Affine, clip: Rect, blend: BlendMode, alpha: f32) {
        self.scene.push_layer(blend, alpha, transform, &clip);
    }

    fn pop_layer(&mut self) {
        self.scene.pop_layer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DocumentPainter, RenderContext};
    use sotoshop_core::Editor;
    use sotoshop_core::layers::ShapeKind;
    use sotoshop_core::NewLayer;

    #[test]
    fn test_editor_frame_encodes_and_resets() {
        let mut editor = Editor::default();
        editor.add_layer(NewLayer::shape(ShapeKind::Circle));
        let mut surface = SceneSurface::new();
        DocumentPainter::new().paint(&RenderContext::for_editor(&editor), &mut surface);
        assert!(!surface.scene().encoding().is_empty());
        surface.reset();
        assert!(surface.scene().encoding().is_empty());
    }
}
