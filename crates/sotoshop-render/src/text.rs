//! Text layout for text layers via Parley.

use parley::layout::PositionedLayoutItem;
use parley::{Alignment, AlignmentOptions, FontContext, FontStack, LayoutContext, StyleProperty};
use peniko::Brush;
use sotoshop_core::layers::{TextAlign, TextLayer};

use crate::renderer::{Glyph, GlyphRun};

fn alignment(align: TextAlign) -> Alignment {
    match align {
        TextAlign::Left => Alignment::Left,
        TextAlign::Center => Alignment::Center,
        TextAlign::Right => Alignment::Right,
    }
}

/// Cached font and layout contexts.
pub struct TextEngine {
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Lay out `text` wrapped to `box_width` and return its glyph runs in
    /// layer-local space, origin at the top-left of the text box.
    ///
    /// Empty when the content is empty or no font could be resolved.
    pub fn layout(&mut self, text: &TextLayer, box_width: f64) -> Vec<GlyphRun> {
        if text.content.is_empty() {
            return Vec::new();
        }

        let brush = Brush::Solid(text.color.into());
        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, &text.content, 1.0, false);
        builder.push_default(StyleProperty::FontSize(text.size as f32));
        builder.push_default(StyleProperty::Brush(brush));
        builder.push_default(StyleProperty::FontStack(FontStack::Source(
            text.font.as_str().into(),
        )));
        let mut layout = builder.build(&text.content);

        let width = (box_width > 0.0).then_some(box_width as f32);
        layout.break_all_lines(width);
        layout.align(width, alignment(text.text_align), AlignmentOptions::default());

        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let glyph_transform = run
                    .synthesis()
                    .skew()
                    .map(|angle| kurbo::Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let positioned = Glyph {
                            id: glyph.id,
                            x: x + glyph.x,
                            y: y - glyph.y,
                        };
                        x += glyph.advance;
                        positioned
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                runs.push(GlyphRun {
                    font: run.font().clone(),
                    font_size: run.font_size(),
                    normalized_coords: run.normalized_coords().to_vec(),
                    glyph_transform,
                    glyphs,
                });
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_has_no_runs() {
        let mut engine = TextEngine::new();
        assert!(engine.layout(&TextLayer::new(""), 200.0).is_empty());
    }

    #[test]
    fn test_alignment_mapping() {
        assert!(matches!(alignment(TextAlign::Left), Alignment::Left));
        assert!(matches!(alignment(TextAlign::Center), Alignment::Center));
        assert!(matches!(alignment(TextAlign::Right), Alignment::Right));
    }

    #[test]
    fn test_glyphs_stay_on_increasing_x() {
        let mut engine = TextEngine::new();
        let runs = engine.layout(&TextLayer::new("Halo"), 1000.0);
        // Hosts without system fonts produce no runs.
        for run in &runs {
            assert!(run.font_size > 0.0);
            let xs: Vec<f32> = run.glyphs.iter().map(|g| g.x).collect();
            assert!(xs.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}
