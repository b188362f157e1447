//! Editor state: the history store plus selection, viewport and gesture state.

use crate::bitmap::{Bitmap, ImportError};
use crate::config::EditorConfig;
use crate::document::{CanvasDocument, CanvasPatch, DocumentPatch};
use crate::history::{HistoryAction, HistoryStore};
use crate::input::PointerEvent;
use crate::interaction::{InteractionController, InteractionState, Tool};
use crate::layers::{Layer, LayerId, LayerPatch, NewLayer};
use crate::viewport::Viewport;
use uuid::Uuid;

/// The running editor.
///
/// Layer operations are total: an unknown id is ignored, never reported.
/// Each returns whether the document changed.
#[derive(Debug, Clone)]
pub struct Editor {
    history: HistoryStore,
    selection: Option<LayerId>,
    pub viewport: Viewport,
    pub tool: Tool,
    controller: InteractionController,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Open an empty document sized and colored from `config`.
    pub fn new(config: EditorConfig) -> Self {
        let config = config.sanitized();
        let document = CanvasDocument::new(
            config.canvas_width,
            config.canvas_height,
            config.background_color,
        );
        Self {
            history: HistoryStore::new(document, config.history_limit),
            selection: None,
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            tool: Tool::Select,
            controller: InteractionController::default(),
            config,
        }
    }

    pub fn document(&self) -> &CanvasDocument {
        self.history.present()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selection
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selection.and_then(|id| self.document().layer(id))
    }

    /// Select a layer. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: LayerId) -> bool {
        if self.document().contains(id) {
            self.selection = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The gesture in progress, if any.
    pub fn interaction(&self) -> Option<&InteractionState> {
        self.controller.state()
    }

    /// Route a pointer event through the interaction controller.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let mut controller = std::mem::take(&mut self.controller);
        let changed = controller.handle_event(self, event);
        self.controller = controller;
        changed
    }

    fn set_layers(&mut self, layers: Vec<Layer>, with_history: bool) -> bool {
        self.history.dispatch(HistoryAction::SetState {
            patch: DocumentPatch::layers(layers),
            with_history,
        })
    }

    fn fresh_id(&self) -> LayerId {
        loop {
            let id = Uuid::new_v4();
            if !self.document().contains(id) {
                return id;
            }
        }
    }

    /// Append a new layer on top, select it and commit.
    pub fn add_layer(&mut self, new: NewLayer) -> LayerId {
        let id = self.fresh_id();
        let mut layers = self.document().layers.clone();
        layers.push(Layer::from_new(id, new));
        self.set_layers(layers, true);
        self.selection = Some(id);
        log::debug!("Added layer {id}");
        id
    }

    /// Apply a partial update to one layer.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch, with_history: bool) -> bool {
        let Some(index) = self.document().index_of(id) else {
            return false;
        };
        let mut layers = self.document().layers.clone();
        layers[index].apply_patch(patch);
        self.set_layers(layers, with_history)
    }

    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let Some(index) = self.document().index_of(id) else {
            return false;
        };
        let mut layers = self.document().layers.clone();
        layers.remove(index);
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.set_layers(layers, true)
    }

    /// Replace the layer list wholesale.
    ///
    /// The list must hold exactly the current layer ids; anything else is ignored.
    pub fn reorder_layers(&mut self, layers: Vec<Layer>) -> bool {
        if !self.document().is_permutation(&layers) {
            log::warn!(
                "Ignoring reorder: {} layers given, ids do not match the document",
                layers.len()
            );
            return false;
        }
        self.set_layers(layers, true)
    }

    /// Change background color or document size.
    pub fn set_canvas(&mut self, patch: CanvasPatch, with_history: bool) -> bool {
        self.history.dispatch(HistoryAction::SetState {
            patch: patch.into(),
            with_history,
        })
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.dispatch(HistoryAction::Undo);
        self.drop_stale_selection();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.dispatch(HistoryAction::Redo);
        self.drop_stale_selection();
        changed
    }

    /// Start over with `document` and empty history.
    pub fn reset(&mut self, document: CanvasDocument) -> bool {
        self.selection = None;
        self.history.dispatch(HistoryAction::Reset(document))
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selection {
            if !self.document().contains(id) {
                self.selection = None;
            }
        }
    }

    /// Copy a layer with a fresh id directly above the source and select it.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let index = self.document().index_of(id)?;
        let new_id = self.fresh_id();
        let mut layers = self.document().layers.clone();
        let mut copy = layers[index].clone();
        copy.id = new_id;
        copy.name = format!("{} copy", copy.name);
        layers.insert(index + 1, copy);
        self.set_layers(layers, true);
        self.selection = Some(new_id);
        Some(new_id)
    }

    fn move_layer(&mut self, id: LayerId, to: impl FnOnce(usize, usize) -> usize) -> bool {
        let Some(from) = self.document().index_of(id) else {
            return false;
        };
        let last = self.document().len() - 1;
        let to = to(from, last).min(last);
        if to == from {
            return false;
        }
        let mut layers = self.document().layers.clone();
        let layer = layers.remove(from);
        layers.insert(to, layer);
        self.set_layers(layers, true)
    }

    /// Move a layer one step toward the top.
    pub fn bring_forward(&mut self, id: LayerId) -> bool {
        self.move_layer(id, |from, _| from + 1)
    }

    /// Move a layer one step toward the bottom.
    pub fn send_backward(&mut self, id: LayerId) -> bool {
        self.move_layer(id, |from, _| from.saturating_sub(1))
    }

    pub fn bring_to_front(&mut self, id: LayerId) -> bool {
        self.move_layer(id, |_, last| last)
    }

    pub fn send_to_back(&mut self, id: LayerId) -> bool {
        self.move_layer(id, |_, _| 0)
    }

    /// Turn a run of history-exempt updates into one undo entry.
    ///
    /// `original` is the layer as it was before the gesture. Returns false and
    /// commits nothing if the layer is gone or unchanged.
    pub fn commit_continuous_edit(&mut self, id: LayerId, original: &Layer) -> bool {
        let Some(index) = self.document().index_of(id) else {
            return false;
        };
        let live = self.document().layers[index].clone();
        if live == *original {
            return false;
        }
        let mut restored = self.document().layers.clone();
        restored[index] = original.clone();
        let mut committed = restored.clone();
        committed[index] = live;
        self.set_layers(restored, false);
        self.set_layers(committed, true)
    }

    /// Commit canvas settings scrubbed with history-exempt edits. `original`
    /// holds the settings from before the scrub.
    pub fn commit_canvas_edit(&mut self, original: CanvasPatch) -> bool {
        let live = CanvasPatch::of(self.document());
        if live == original {
            return false;
        }
        self.set_canvas(original, false);
        self.set_canvas(live, true)
    }

    /// Decode `bytes` and add the picture as a new layer fitted inside the document.
    ///
    /// On failure the document is left unchanged.
    pub fn add_image_layer(
        &mut self,
        bytes: &[u8],
        original_src: impl Into<String>,
    ) -> Result<LayerId, ImportError> {
        let original_src = original_src.into();
        let bitmap = Bitmap::decode(bytes).inspect_err(|e| {
            log::warn!("Image import from {original_src} failed: {e}");
        })?;
        Ok(self.add_decoded_image(bitmap, original_src))
    }

    /// Add an already decoded bitmap as a new layer fitted inside the document.
    pub fn add_decoded_image(&mut self, bitmap: Bitmap, original_src: impl Into<String>) -> LayerId {
        let (doc_w, doc_h) = (self.document().width as f64, self.document().height as f64);
        let (w, h) = (bitmap.width(), bitmap.height());
        let id = self.add_layer(NewLayer::image(bitmap, original_src).fit_within(doc_w, doc_h));
        log::info!("Imported {w}x{h} image as layer {id}");
        id
    }
}
