//! The canvas document: background, dimensions and the ordered layer stack.

use crate::color::RgbaColor;
use crate::layers::{Layer, LayerId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Default document edge length in pixels.
pub const DEFAULT_DOCUMENT_SIZE: u32 = 1080;

/// The document being edited.
///
/// Layers are stored bottom-to-top: index 0 is painted first.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasDocument {
    pub layers: Vec<Layer>,
    pub background_color: RgbaColor,
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new(DEFAULT_DOCUMENT_SIZE, DEFAULT_DOCUMENT_SIZE, RgbaColor::white())
    }
}

impl CanvasDocument {
    /// Create an empty document. Zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32, background_color: RgbaColor) -> Self {
        Self {
            layers: Vec::new(),
            background_color,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// The document rectangle in document space.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Topmost visible layer containing `point` (document space).
    pub fn layer_at(&self, point: Point) -> Option<&Layer> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.is_visible && l.contains(point))
    }

    /// Whether `layers` holds exactly the same ids as this document, in any order.
    pub fn is_permutation(&self, layers: &[Layer]) -> bool {
        if layers.len() != self.layers.len() {
            return false;
        }
        let mut ours: Vec<LayerId> = self.layers.iter().map(Layer::id).collect();
        let mut theirs: Vec<LayerId> = layers.iter().map(Layer::id).collect();
        ours.sort_unstable();
        theirs.sort_unstable();
        ours == theirs
    }
}

/// Partial document used by the history store. `None` fields keep the present value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub layers: Option<Vec<Layer>>,
    pub background_color: Option<RgbaColor>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DocumentPatch {
    pub fn layers(layers: Vec<Layer>) -> Self {
        Self {
            layers: Some(layers),
            ..Self::default()
        }
    }

    /// Merge into a copy of `doc`.
    pub fn merged_with(&self, doc: &CanvasDocument) -> CanvasDocument {
        CanvasDocument {
            layers: self.layers.clone().unwrap_or_else(|| doc.layers.clone()),
            background_color: self.background_color.unwrap_or(doc.background_color),
            width: self.width.map_or(doc.width, |w| w.max(1)),
            height: self.height.map_or(doc.height, |h| h.max(1)),
        }
    }
}

/// Canvas-level settings edited from the properties panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasPatch {
    pub background_color: Option<RgbaColor>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CanvasPatch {
    /// Patch restoring the canvas settings of `doc`.
    pub fn of(doc: &CanvasDocument) -> Self {
        Self {
            background_color: Some(doc.background_color),
            width: Some(doc.width),
            height: Some(doc.height),
        }
    }
}

impl From<CanvasPatch> for DocumentPatch {
    fn from(patch: CanvasPatch) -> Self {
        Self {
            layers: None,
            background_color: patch.background_color,
            width: patch.width,
            height: patch.height,
        }
    }
}
