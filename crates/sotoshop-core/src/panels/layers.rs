use crate::document::CanvasDocument;
use crate::editor::Editor;
use crate::layers::{Layer, LayerId, LayerPatch};

/// One row of the layers panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub id: LayerId,
    pub name: String,
    /// "Text", "Image" or "Shape".
    pub kind: &'static str,
    pub is_visible: bool,
    pub is_locked: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Rename {
    id: LayerId,
    text: String,
}

/// Layers panel state. Rows are listed top-most first.
#[derive(Debug, Clone, Default)]
pub struct LayersPanel {
    rename: Option<Rename>,
}

impl LayersPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in display order: the reverse of storage order.
    pub fn rows(doc: &CanvasDocument, selected: Option<LayerId>) -> Vec<LayerRow> {
        doc.layers
            .iter()
            .rev()
            .map(|layer| LayerRow {
                id: layer.id(),
                name: layer.name.clone(),
                kind: layer.kind.label(),
                is_visible: layer.is_visible,
                is_locked: layer.is_locked,
                is_selected: selected == Some(layer.id()),
            })
            .collect()
    }

    /// Storage-order layer list after dragging display row `from_row` onto `to_row`.
    ///
    /// Returns `None` for out-of-range rows or a drop onto the same row.
    pub fn reorder(doc: &CanvasDocument, from_row: usize, to_row: usize) -> Option<Vec<Layer>> {
        let count = doc.layers.len();
        if from_row >= count || to_row >= count || from_row == to_row {
            return None;
        }
        let from = count - 1 - from_row;
        let to = count - 1 - to_row;
        let mut layers = doc.layers.clone();
        let layer = layers.remove(from);
        layers.insert(to, layer);
        Some(layers)
    }

    /// Apply a row drag through [`Editor::reorder_layers`].
    pub fn drag_row(editor: &mut Editor, from_row: usize, to_row: usize) -> bool {
        match Self::reorder(editor.document(), from_row, to_row) {
            Some(layers) => editor.reorder_layers(layers),
            None => false,
        }
    }

    pub fn select_row(editor: &mut Editor, row: usize) -> bool {
        let doc = editor.document();
        let Some(index) = doc.layers.len().checked_sub(row + 1) else {
            return false;
        };
        let id = doc.layers[index].id();
        editor.select(id)
    }

    pub fn toggle_visibility(editor: &mut Editor, id: LayerId) -> bool {
        let Some(visible) = editor.document().layer(id).map(|l| l.is_visible) else {
            return false;
        };
        let patch = LayerPatch {
            is_visible: Some(!visible),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true)
    }

    pub fn toggle_lock(editor: &mut Editor, id: LayerId) -> bool {
        let Some(locked) = editor.document().layer(id).map(|l| l.is_locked) else {
            return false;
        };
        let patch = LayerPatch {
            is_locked: Some(!locked),
            ..LayerPatch::default()
        };
        editor.update_layer(id, &patch, true)
    }

    /// Start renaming `id`, seeding the field with its current name.
    pub fn begin_rename(&mut self, doc: &CanvasDocument, id: LayerId) -> bool {
        match doc.layer(id) {
            Some(layer) => {
                self.rename = Some(Rename {
                    id,
                    text: layer.name.clone(),
                });
                true
            }
            None => false,
        }
    }

    pub fn edit_rename(&mut self, text: impl Into<String>) {
        if let Some(rename) = &mut self.rename {
            rename.text = text.into();
        }
    }

    /// The layer being renamed and the text typed so far.
    pub fn renaming(&self) -> Option<(LayerId, &str)> {
        self.rename.as_ref().map(|r| (r.id, r.text.as_str()))
    }

    /// Write the trimmed name back. An empty name keeps the old one.
    pub fn commit_rename(&mut self, editor: &mut Editor) -> bool {
        let Some(rename) = self.rename.take() else {
            return false;
        };
        let name = rename.text.trim();
        if name.is_empty() {
            return false;
        }
        let patch = LayerPatch {
            name: Some(name.to_string()),
            ..LayerPatch::default()
        };
        editor.update_layer(rename.id, &patch, true)
    }

    pub fn cancel_rename(&mut self) {
        self.rename = None;
    }
}
