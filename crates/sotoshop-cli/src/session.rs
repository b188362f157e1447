//! JSON editing sessions replayed through the editor.
//!
//! ```json
//! {
//!   "canvas": { "width": 800, "height": 600, "background_color": "#202020" },
//!   "commands": [
//!     { "op": "add_shape", "shape": "circle", "x": 100, "y": 100, "width": 200, "height": 200 },
//!     { "op": "add_text", "content": "Halo" },
//!     { "op": "update", "layer": 1, "patch": { "rotation": 15 } },
//!     { "op": "drag", "layer": 0, "from": [200, 200], "to": [300, 250] },
//!     { "op": "undo" }
//!   ]
//! }
//! ```
//!
//! Layers are addressed by creation index: the first `add_*` command creates
//! layer 0, the next layer 1, and so on, including layers later deleted.

use std::path::{Path, PathBuf};

use kurbo::Point;
use serde::Deserialize;
use sotoshop_core::layers::ShapeKind;
use sotoshop_core::{CanvasPatch, Editor, LayerId, LayerPatch, NewLayer, PointerEvent};

use crate::error::{CliError, CliResult};

const DRAG_POINTER: u64 = 1;

/// Optional placement shared by the `add_*` commands.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Placement {
    fn apply(&self, mut new: NewLayer) -> NewLayer {
        if let Some(name) = &self.name {
            new = new.named(name.clone());
        }
        let x = self.x.unwrap_or(new.x);
        let y = self.y.unwrap_or(new.y);
        let width = self.width.unwrap_or(new.width);
        let height = self.height.unwrap_or(new.height);
        new.at(x, y).sized(width, height)
    }
}

fn default_true() -> bool {
    true
}

fn default_steps() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    AddText {
        content: String,
        #[serde(flatten)]
        place: Placement,
    },
    AddShape {
        shape: ShapeKind,
        #[serde(flatten)]
        place: Placement,
    },
    AddImage {
        path: PathBuf,
    },
    Update {
        layer: usize,
        patch: LayerPatch,
        #[serde(default = "default_true")]
        with_history: bool,
    },
    Delete {
        layer: usize,
    },
    /// New storage order, bottom first, as creation indices.
    Reorder {
        order: Vec<usize>,
    },
    Select {
        layer: usize,
    },
    Deselect,
    Canvas {
        #[serde(flatten)]
        patch: CanvasPatch,
    },
    Undo,
    Redo,
    /// Pointer drag in document coordinates on the given layer.
    Drag {
        layer: usize,
        from: [f64; 2],
        to: [f64; 2],
        #[serde(default = "default_steps")]
        steps: u32,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::AddText { .. } => "add_text",
            Command::AddShape { .. } => "add_shape",
            Command::AddImage { .. } => "add_image",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Reorder { .. } => "reorder",
            Command::Select { .. } => "select",
            Command::Deselect => "deselect",
            Command::Canvas { .. } => "canvas",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Drag { .. } => "drag",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Applied before the first command, outside history.
    pub canvas: Option<CanvasPatch>,
    pub commands: Vec<Command>,
}

impl Session {
    pub fn from_json(json: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Outcome of a replay.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Commands that changed the document or the selection.
    pub applied: usize,
    /// Commands that were skipped, with the reason.
    pub skipped: Vec<String>,
}

/// Drives an [`Editor`] from session commands.
pub struct Replayer {
    editor: Editor,
    created: Vec<LayerId>,
    /// Base directory for relative image paths.
    base_dir: PathBuf,
}

impl Replayer {
    pub fn new(editor: Editor, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            editor,
            created: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn into_editor(self) -> Editor {
        self.editor
    }

    /// Layer id for a creation index.
    pub fn layer(&self, index: usize) -> Option<LayerId> {
        self.created.get(index).copied()
    }

    pub fn replay(&mut self, session: &Session) -> ReplayReport {
        let mut report = ReplayReport::default();
        if let Some(canvas) = session.canvas {
            self.editor.set_canvas(canvas, false);
        }
        for (index, command) in session.commands.iter().enumerate() {
            match self.apply(command) {
                Ok(true) => report.applied += 1,
                Ok(false) => log::debug!("command {index} ({}) had no effect", command.name()),
                Err(reason) => {
                    log::warn!("skipping command {index} ({}): {reason}", command.name());
                    report
                        .skipped
                        .push(format!("command {index} ({}): {reason}", command.name()));
                }
            }
        }
        report
    }

    fn resolve(&self, index: usize) -> Result<LayerId, String> {
        self.layer(index)
            .ok_or_else(|| format!("no layer was created with index {index}"))
    }

    fn apply(&mut self, command: &Command) -> Result<bool, String> {
        let changed = match command {
            Command::AddText { content, place } => {
                let id = self.editor.add_layer(place.apply(NewLayer::text(content.clone())));
                self.created.push(id);
                true
            }
            Command::AddShape { shape, place } => {
                let id = self.editor.add_layer(place.apply(NewLayer::shape(*shape)));
                self.created.push(id);
                true
            }
            Command::AddImage { path } => {
                let path = self.base_dir.join(path);
                let bytes = std::fs::read(&path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                let id = self
                    .editor
                    .add_image_layer(&bytes, path.display().to_string())
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                self.created.push(id);
                true
            }
            Command::Update {
                layer,
                patch,
                with_history,
            } => {
                let id = self.resolve(*layer)?;
                self.editor.update_layer(id, patch, *with_history)
            }
            Command::Delete { layer } => {
                let id = self.resolve(*layer)?;
                self.editor.delete_layer(id)
            }
            Command::Reorder { order } => {
                let mut layers = Vec::with_capacity(order.len());
                for index in order {
                    let id = self.resolve(*index)?;
                    let layer = self
                        .editor
                        .document()
                        .layer(id)
                        .ok_or_else(|| format!("layer {index} was deleted"))?;
                    layers.push(layer.clone());
                }
                if !self.editor.reorder_layers(layers) {
                    return Err("order is not a permutation of the current layers".into());
                }
                true
            }
            Command::Select { layer } => {
                let id = self.resolve(*layer)?;
                if !self.editor.select(id) {
                    return Err(format!("layer {layer} is not in the document"));
                }
                true
            }
            Command::Deselect => {
                let had = self.editor.selected_id().is_some();
                self.editor.clear_selection();
                had
            }
            Command::Canvas { patch } => self.editor.set_canvas(*patch, true),
            Command::Undo => self.editor.undo(),
            Command::Redo => self.editor.redo(),
            Command::Drag {
                layer,
                from,
                to,
                steps,
            } => {
                let id = self.resolve(*layer)?;
                if !self.editor.select(id) {
                    return Err(format!("layer {layer} is not in the document"));
                }
                self.drag(Point::new(from[0], from[1]), Point::new(to[0], to[1]), *steps)
            }
        };
        Ok(changed)
    }

    /// Press at `from`, move in `steps` increments, release at `to`.
    /// Positions are document coordinates mapped through the viewport.
    fn drag(&mut self, from: Point, to: Point, steps: u32) -> bool {
        let viewport = self.editor.viewport;
        let screen = |p: Point| viewport.document_to_screen(p);

        self.editor
            .handle_pointer(PointerEvent::down(DRAG_POINTER, screen(from)));
        let steps = steps.max(1);
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            self.editor
                .handle_pointer(PointerEvent::moved(DRAG_POINTER, screen(from.lerp(to, t))));
        }
        // Releasing the pointer reports whether the gesture committed.
        self.editor
            .handle_pointer(PointerEvent::up(DRAG_POINTER, screen(to)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotoshop_core::{EditorConfig, RgbaColor};

    fn replay(json: &str) -> (Replayer, ReplayReport) {
        let session = Session::from_json(json).unwrap();
        let mut replayer = Replayer::new(Editor::default(), ".");
        let report = replayer.replay(&session);
        (replayer, report)
    }

    #[test]
    fn test_parse_commands() {
        let session = Session::from_json(
            r##"{
                "canvas": { "width": 640, "height": 480, "background_color": "#000000" },
                "commands": [
                    { "op": "add_text", "content": "Halo", "x": 10, "name": "Title" },
                    { "op": "add_shape", "shape": "circle" },
                    { "op": "update", "layer": 0, "patch": { "opacity": 50 } },
                    { "op": "drag", "layer": 1, "from": [1, 2], "to": [3, 4] },
                    { "op": "undo" }
                ]
            }"##,
        )
        .unwrap();
        let canvas = session.canvas.unwrap();
        assert_eq!(canvas.width, Some(640));
        assert_eq!(canvas.background_color, Some(RgbaColor::black()));
        assert_eq!(session.commands.len(), 5);
        match &session.commands[0] {
            Command::AddText { content, place } => {
                assert_eq!(content, "Halo");
                assert_eq!(place.x, Some(10.0));
                assert_eq!(place.name.as_deref(), Some("Title"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            session.commands[2],
            Command::Update {
                layer: 0,
                with_history: true,
                ..
            }
        ));
        assert!(matches!(session.commands[3], Command::Drag { steps: 10, .. }));
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(matches!(
            Session::from_json(r#"{ "commands": [{ "op": "explode" }] }"#),
            Err(CliError::Session(_))
        ));
    }

    #[test]
    fn test_text_undo_redo_session() {
        let (replayer, report) = replay(
            r#"{ "commands": [
                { "op": "add_text", "content": "Halo" },
                { "op": "undo" },
                { "op": "redo" }
            ] }"#,
        );
        assert_eq!(report.applied, 3);
        let doc = replayer.editor().document();
        assert_eq!(doc.layers.len(), 1);
        assert_eq!(doc.layers[0].as_text().unwrap().content, "Halo");
    }

    #[test]
    fn test_reorder_by_creation_index() {
        let (replayer, report) = replay(
            r#"{ "commands": [
                { "op": "add_shape", "shape": "rectangle", "name": "A" },
                { "op": "add_shape", "shape": "rectangle", "name": "B" },
                { "op": "add_shape", "shape": "rectangle", "name": "C" },
                { "op": "reorder", "order": [2, 0, 1] },
                { "op": "reorder", "order": [0, 1] }
            ] }"#,
        );
        let names: Vec<_> = replayer
            .editor()
            .document()
            .layers
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_missing_layer_and_bad_image_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let session = Session::from_json(
            r#"{ "commands": [
                { "op": "add_shape", "shape": "rectangle" },
                { "op": "add_image", "path": "broken.png" },
                { "op": "add_image", "path": "missing.png" },
                { "op": "delete", "layer": 5 }
            ] }"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(Editor::default(), dir.path());
        let report = replayer.replay(&session);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(replayer.editor().document().layers.len(), 1);
        assert_eq!(replayer.editor().history().past_len(), 1);
    }

    #[test]
    fn test_drag_counted_with_full_history() {
        let session = Session::from_json(
            r#"{ "commands": [
                { "op": "add_shape", "shape": "rectangle", "x": 100, "y": 100, "width": 200, "height": 100 },
                { "op": "drag", "layer": 0, "from": [150, 150], "to": [250, 180] }
            ] }"#,
        )
        .unwrap();
        let config = EditorConfig {
            history_limit: Some(1),
            ..EditorConfig::default()
        };
        let mut replayer = Replayer::new(Editor::new(config), ".");
        let report = replayer.replay(&session);
        assert_eq!(report.applied, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(replayer.editor().history().past_len(), 1);
        assert!((replayer.editor().document().layers[0].x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_moves_layer_with_one_history_entry() {
        let (replayer, report) = replay(
            r#"{ "commands": [
                { "op": "add_shape", "shape": "rectangle", "x": 100, "y": 100, "width": 200, "height": 100 },
                { "op": "drag", "layer": 0, "from": [150, 150], "to": [250, 180], "steps": 10 }
            ] }"#,
        );
        assert_eq!(report.applied, 2);
        let editor = replayer.editor();
        let layer = &editor.document().layers[0];
        assert!((layer.x - 200.0).abs() < 1e-9);
        assert!((layer.y - 130.0).abs() < 1e-9);
        assert_eq!(editor.history().past_len(), 2);
    }

    #[test]
    fn test_canvas_block_is_outside_history() {
        let session = Session::from_json(
            r#"{ "canvas": { "width": 300 }, "commands": [] }"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(Editor::new(EditorConfig::default()), ".");
        replayer.replay(&session);
        assert_eq!(replayer.editor().document().width, 300);
        assert!(!replayer.editor().history().can_undo());
    }
}
