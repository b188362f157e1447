//! Sotoshop Core Library
//!
//! Platform-agnostic document model, history and interaction logic for the
//! Sotoshop layer-based canvas editor.

pub mod bitmap;
pub mod color;
pub mod config;
pub mod document;
pub mod editor;
pub mod history;
pub mod input;
pub mod interaction;
pub mod layers;
pub mod panels;
pub mod selection;
pub mod viewport;

pub use bitmap::{Bitmap, ImportError};
pub use color::RgbaColor;
pub use config::{ConfigError, EditorConfig};
pub use document::{CanvasDocument, CanvasPatch, DocumentPatch};
pub use editor::Editor;
pub use history::{HistoryAction, HistoryState, HistoryStore, reduce};
pub use input::{Modifiers, MouseButton, PointerEvent, PointerId};
pub use interaction::{InteractionState, Tool};
pub use layers::{BlendMode, Layer, LayerId, LayerKind, LayerPatch, NewLayer};
pub use selection::{Handle, HandleKind};
pub use viewport::Viewport;
