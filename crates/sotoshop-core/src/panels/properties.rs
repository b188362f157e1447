//! Properties panel view-model: editable fields of the selected layer or of
//! the canvas, with live scrubs committed as a single undo step.

use crate::color::RgbaColor;
use crate::document::{CanvasDocument, CanvasPatch};
use crate::editor::Editor;
use crate::layers::{
    BlendMode, ImageFilters, ImagePatch, Layer, LayerId, LayerKind, LayerPatch, Shadow,
    ShapeLayer, ShapePatch, TextLayer, TextPatch,
};
use std::collections::HashSet;

/// Fields shared by every layer kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonProperties {
    pub id: LayerId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    pub shadow: Shadow,
    pub is_visible: bool,
    pub is_locked: bool,
}

impl CommonProperties {
    fn from_layer(layer: &Layer) -> Self {
        Self {
            id: layer.id(),
            name: layer.name.clone(),
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
            rotation: layer.rotation,
            opacity: layer.opacity,
            blend_mode: layer.blend_mode,
            shadow: layer.shadow,
            is_visible: layer.is_visible,
            is_locked: layer.is_locked,
        }
    }
}

/// Variant-specific fields of the selected layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerDetail {
    Text(TextLayer),
    Image {
        filters: ImageFilters,
        original_src: String,
        natural_width: u32,
        natural_height: u32,
    },
    Shape(ShapeLayer),
}

/// What the properties panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesView {
    /// Nothing selected.
    Canvas {
        background_color: RgbaColor,
        width: u32,
        height: u32,
    },
    Layer {
        common: CommonProperties,
        detail: LayerDetail,
    },
}

/// Collapsible panel sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Transform,
    Appearance,
    Shadow,
    Content,
    Filters,
}

impl PropertiesView {
    /// Sections that apply to this view, in panel order.
    pub fn sections(&self) -> &'static [Section] {
        match self {
            PropertiesView::Canvas { .. } => &[],
            PropertiesView::Layer {
                detail: LayerDetail::Image { .. },
                ..
            } => &[
                Section::Transform,
                Section::Appearance,
                Section::Shadow,
                Section::Filters,
            ],
            PropertiesView::Layer { .. } => &[
                Section::Transform,
                Section::Appearance,
                Section::Shadow,
                Section::Content,
            ],
        }
    }
}

/// A single edit made in the properties panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEdit {
    BackgroundColor(RgbaColor),
    CanvasWidth(u32),
    CanvasHeight(u32),
    Name(String),
    X(f64),
    Y(f64),
    Width(f64),
    Height(f64),
    Rotation(f64),
    Opacity(f64),
    BlendMode(BlendMode),
    Shadow(Shadow),
    Visible(bool),
    Locked(bool),
    Text(TextPatch),
    Filters(ImageFilters),
    Shape(ShapePatch),
}

#[derive(Debug, Clone, PartialEq)]
enum Scrub {
    Layer(Layer),
    Canvas(CanvasPatch),
}

/// Properties panel state.
#[derive(Debug, Clone)]
pub struct PropertiesPanel {
    collapsed: HashSet<Section>,
    /// Snapshot taken when a live edit started.
    scrub: Option<Scrub>,
}

impl Default for PropertiesPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesPanel {
    /// All sections start open.
    pub fn new() -> Self {
        Self {
            collapsed: HashSet::new(),
            scrub: None,
        }
    }

    pub fn view(doc: &CanvasDocument, selected: Option<LayerId>) -> PropertiesView {
        let Some(layer) = selected.and_then(|id| doc.layer(id)) else {
            return PropertiesView::Canvas {
                background_color: doc.background_color,
                width: doc.width,
                height: doc.height,
            };
        };
        let detail = match &layer.kind {
            LayerKind::Text(text) => LayerDetail::Text(text.clone()),
            LayerKind::Image(image) => LayerDetail::Image {
                filters: image.filters,
                original_src: image.original_src.clone(),
                natural_width: image.image.width(),
                natural_height: image.image.height(),
            },
            LayerKind::Shape(shape) => LayerDetail::Shape(shape.clone()),
        };
        PropertiesView::Layer {
            common: CommonProperties::from_layer(layer),
            detail,
        }
    }

    pub fn is_open(&self, section: Section) -> bool {
        !self.collapsed.contains(&section)
    }

    pub fn toggle_section(&mut self, section: Section) {
        if !self.collapsed.remove(&section) {
            self.collapsed.insert(section);
        }
    }

    /// Apply one edit to the selection, or to the canvas when nothing is selected.
    ///
    /// `live` edits (slider drags, color picker scrubs) skip history; call
    /// [`finish_scrub`](Self::finish_scrub) when the control is released.
    pub fn apply(&mut self, editor: &mut Editor, edit: PropertyEdit, live: bool) -> bool {
        let patch = canvas_patch(&edit);
        let target = if patch.is_some() {
            None
        } else {
            match editor.selected_id() {
                Some(id) => Some(id),
                None => return false,
            }
        };
        // A scrub on another target is committed before this edit starts.
        if !self.scrubbing(target) {
            self.finish_scrub(editor);
        }
        match patch {
            Some(patch) => {
                if live && self.scrub.is_none() {
                    self.scrub = Some(Scrub::Canvas(CanvasPatch::of(editor.document())));
                }
                let changed = editor.set_canvas(patch, !live && self.scrub.is_none());
                if !live {
                    return self.finish_scrub(editor) || changed;
                }
                changed
            }
            None => {
                let Some(layer) = editor.selected_layer().cloned() else {
                    return false;
                };
                let min_size = editor.config().min_layer_size;
                let patch = layer_patch(edit, min_size);
                if live && self.scrub.is_none() {
                    self.scrub = Some(Scrub::Layer(layer.clone()));
                }
                let changed = editor.update_layer(layer.id(), &patch, !live && self.scrub.is_none());
                if !live {
                    return self.finish_scrub(editor) || changed;
                }
                changed
            }
        }
    }

    /// Commit everything changed since the first live edit as one undo entry.
    pub fn finish_scrub(&mut self, editor: &mut Editor) -> bool {
        match self.scrub.take() {
            Some(Scrub::Layer(original)) => editor.commit_continuous_edit(original.id(), &original),
            Some(Scrub::Canvas(original)) => editor.commit_canvas_edit(original),
            None => false,
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    /// Whether the pending scrub, if any, edits `target` (`None` is the canvas).
    fn scrubbing(&self, target: Option<LayerId>) -> bool {
        match (&self.scrub, target) {
            (None, _) | (Some(Scrub::Canvas(_)), None) => true,
            (Some(Scrub::Layer(original)), Some(id)) => original.id() == id,
            _ => false,
        }
    }
}

fn canvas_patch(edit: &PropertyEdit) -> Option<CanvasPatch> {
    let patch = match edit {
        PropertyEdit::BackgroundColor(color) => CanvasPatch {
            background_color: Some(*color),
            ..CanvasPatch::default()
        },
        PropertyEdit::CanvasWidth(width) => CanvasPatch {
            width: Some(*width),
            ..CanvasPatch::default()
        },
        PropertyEdit::CanvasHeight(height) => CanvasPatch {
            height: Some(*height),
            ..CanvasPatch::default()
        },
        _ => return None,
    };
    Some(patch)
}

fn layer_patch(edit: PropertyEdit, min_size: f64) -> LayerPatch {
    let mut patch = LayerPatch::default();
    match edit {
        PropertyEdit::Name(name) => {
            let name = name.trim();
            if !name.is_empty() {
                patch.name = Some(name.to_string());
            }
        }
        PropertyEdit::X(x) => patch.x = Some(x).filter(|v| v.is_finite()),
        PropertyEdit::Y(y) => patch.y = Some(y).filter(|v| v.is_finite()),
        PropertyEdit::Width(w) => {
            patch.width = Some(w).filter(|v| v.is_finite()).map(|v| v.max(min_size))
        }
        PropertyEdit::Height(h) => {
            patch.height = Some(h).filter(|v| v.is_finite()).map(|v| v.max(min_size))
        }
        PropertyEdit::Rotation(r) => patch.rotation = Some(r).filter(|v| v.is_finite()),
        PropertyEdit::Opacity(o) => patch.opacity = Some(o),
        PropertyEdit::BlendMode(mode) => patch.blend_mode = Some(mode),
        PropertyEdit::Shadow(shadow) => patch.shadow = Some(shadow),
        PropertyEdit::Visible(visible) => patch.is_visible = Some(visible),
        PropertyEdit::Locked(locked) => patch.is_locked = Some(locked),
        PropertyEdit::Text(text) => patch.text = Some(text),
        PropertyEdit::Filters(filters) => {
            patch.image = Some(ImagePatch {
                filters: Some(filters),
                ..ImagePatch::default()
            })
        }
        PropertyEdit::Shape(shape) => patch.shape = Some(shape),
        PropertyEdit::BackgroundColor(_)
        | PropertyEdit::CanvasWidth(_)
        | PropertyEdit::CanvasHeight(_) => {}
    }
    patch
}
