//! View-models for the layers and properties panels.
//!
//! Panels hold only transient UI state (rename in progress, open sections,
//! scrub snapshots). They read the document and write back exclusively
//! through [`Editor`](crate::editor::Editor) operations.

mod layers;
mod properties;

pub use layers::{LayerRow, LayersPanel};
pub use properties::{
    CommonProperties, LayerDetail, PropertiesPanel, PropertiesView, PropertyEdit, Section,
};
