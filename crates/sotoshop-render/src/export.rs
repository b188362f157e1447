//! PNG export of a whole document.

use std::path::Path;

use sotoshop_core::CanvasDocument;
use thiserror::Error;

use crate::cpu_surface::CpuSurface;
use crate::renderer::{DocumentPainter, RenderContext};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("document {width}x{height} exceeds the export limit of 65535px per side")]
    TooLarge { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        ExportError::Encode(err.to_string())
    }
}

/// Render `doc` at its own size, without viewport or selection, and encode it as PNG.
pub fn export_png(doc: &CanvasDocument, painter: &mut DocumentPainter) -> Result<Vec<u8>, ExportError> {
    let too_large = || ExportError::TooLarge {
        width: doc.width,
        height: doc.height,
    };
    let width = u16::try_from(doc.width).map_err(|_| too_large())?;
    let height = u16::try_from(doc.height).map_err(|_| too_large())?;

    let mut surface = CpuSurface::new(width, height);
    painter.paint(&RenderContext::new(doc), &mut surface);
    let rgba = surface.into_rgba8();

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, doc.width, doc.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
        writer.finish()?;
    }
    log::info!(
        "exported {}x{} document with {} layers ({} bytes)",
        doc.width,
        doc.height,
        doc.layers.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// [`export_png`] straight to a file.
pub fn export_png_to(
    doc: &CanvasDocument,
    painter: &mut DocumentPainter,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let bytes = export_png(doc, painter)?;
    std::fs::write(path, &bytes)?;
    log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
