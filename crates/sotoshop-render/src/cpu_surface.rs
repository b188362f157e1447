//! Off-screen painting with `vello_cpu`.

use kurbo::{Affine, BezPath, Rect, Shape, Stroke};
use peniko::{BlendMode, Color, Fill, ImageData, ImageSampler};
use vello_cpu::{Image as CpuImage, ImageSource, Pixmap, RenderContext};

use crate::renderer::{GlyphRun, PaintSurface};

/// [`PaintSurface`] backed by a `vello_cpu` render context.
pub struct CpuSurface {
    ctx: RenderContext,
    width: u16,
    height: u16,
}

impl CpuSurface {
    pub fn new(width: u16, height: u16) -> Self {
        let mut ctx = RenderContext::new(width, height);
        ctx.set_fill_rule(Fill::NonZero);
        Self { ctx, width, height }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Rasterize everything painted so far into straight RGBA8 rows.
    pub fn into_rgba8(mut self) -> Vec<u8> {
        let mut pixmap = Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut data = Vec::with_capacity(usize::from(self.width) * usize::from(self.height) * 4);
        for p in pixmap.data() {
            data.extend_from_slice(&unpremultiply([p.r, p.g, p.b, p.a]));
        }
        data
    }
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 || a == 255 {
        return [r, g, b, a];
    }
    let un = |c: u8| ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
    [un(r), un(g), un(b), a]
}

impl PaintSurface for CpuSurface {
    fn fill_rect(&mut self, transform: Affine, rect: Rect, color: Color) {
        self.ctx.set_transform(transform);
        self.ctx.set_paint(color);
        self.ctx.fill_rect(&rect);
    }

    fn fill_path(&mut self, transform: Affine, path: &BezPath, color: Color) {
        self.ctx.set_transform(transform);
        self.ctx.set_paint(color);
        self.ctx.fill_path(path);
    }

    fn stroke_path(&mut self, transform: Affine, path: &BezPath, width: f64, color: Color) {
        self.ctx.set_transform(transform);
        self.ctx.set_paint(color);
        self.ctx.set_stroke(Stroke::new(width));
        self.ctx.stroke_path(path);
    }

    fn draw_image(&mut self, transform: Affine, image: &ImageData) {
        let paint = CpuImage {
            image: ImageSource::from_peniko_image_data(image),
            sampler: ImageSampler::default(),
        };
        self.ctx.set_transform(transform);
        self.ctx.set_paint(paint);
        let rect = Rect::new(0.0, 0.0, f64::from(image.width), f64::from(image.height));
        self.ctx.fill_rect(&rect);
    }

    fn draw_glyphs(&mut self, transform: Affine, run: &GlyphRun, color: Color) {
        self.ctx.set_transform(transform);
        self.ctx.set_paint(color);
        let mut builder = self
            .ctx
            .glyph_run(&run.font)
            .font_size(run.font_size)
            .hint(true)
            .normalized_coords(&run.normalized_coords);
        if let Some(skew) = run.glyph_transform {
            builder = builder.glyph_transform(skew);
        }
        builder.fill_glyphs(run.glyphs.iter().map(|glyph| vello_cpu::Glyph {
            id: glyph.id,
            x: glyph.x,
            y: glyph.y,
        }));
    }

    fn push_layer(&mut self, transform: Affine, clip: Rect, blend: BlendMode, alpha: f32) {
        self.ctx.set_transform(transform);
        let clip = clip.to_path(0.1);
        self.ctx
            .push_layer(Some(&clip), Some(blend), Some(alpha), None, None);
    }

    fn pop_layer(&mut self) {
        self.ctx.pop_layer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * width + x) * 4;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn test_fill_rect_covers_pixels() {
        let mut surface = CpuSurface::new(8, 8);
        surface.fill_rect(
            Affine::IDENTITY,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Color::from_rgba8(255, 255, 255, 255),
        );
        surface.fill_rect(
            Affine::translate((4.0, 0.0)),
            Rect::new(0.0, 0.0, 4.0, 8.0),
            Color::from_rgba8(255, 0, 0, 255),
        );
        let data = surface.into_rgba8();
        assert_eq!(data.len(), 8 * 8 * 4);
        assert_eq!(pixel(&data, 8, 1, 4), [255, 255, 255, 255]);
        assert_eq!(pixel(&data, 8, 6, 4), [255, 0, 0, 255]);
    }

    #[test]
    fn test_group_alpha_applies() {
        let mut surface = CpuSurface::new(4, 4);
        let full = Rect::new(0.0, 0.0, 4.0, 4.0);
        surface.push_layer(
            Affine::IDENTITY,
            full,
            BlendMode::default(),
            0.5,
        );
        surface.fill_rect(Affine::IDENTITY, full, Color::from_rgba8(0, 0, 255, 255));
        surface.pop_layer();
        let [_, _, b, a] = pixel(&surface.into_rgba8(), 4, 2, 2);
        assert!((i32::from(a) - 128).abs() <= 2);
        assert!(b >= 250);
    }

    #[test]
    fn test_unpremultiply() {
        assert_eq!(unpremultiply([0, 0, 0, 0]), [0, 0, 0, 0]);
        assert_eq!(unpremultiply([64, 0, 32, 128]), [128, 0, 64, 128]);
        assert_eq!(unpremultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    }
}
