//! Sotoshop Render Library
//!
//! Paints a document through the [`PaintSurface`] seam. [`SceneSurface`]
//! builds a Vello scene for on-screen use; [`CpuSurface`] rasterizes with
//! `vello_cpu` for PNG export.

mod cpu_surface;
mod export;
mod filters;
mod renderer;
#[cfg(feature = "vello-renderer")]
mod scene_surface;
mod text;

pub use cpu_surface::CpuSurface;
pub use export::{ExportError, export_png, export_png_to};
pub use filters::apply_filters;
pub use renderer::{DocumentPainter, Glyph, GlyphRun, PaintSurface, RenderContext, peniko_blend};
#[cfg(feature = "vello-renderer")]
pub use scene_surface::SceneSurface;
pub use text::TextEngine;

pub use kurbo;
pub use peniko;
