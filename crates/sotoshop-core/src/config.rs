//! Editor configuration.

use crate::color::RgbaColor;
use crate::document::DEFAULT_DOCUMENT_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a new editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: RgbaColor,
    /// Maximum number of undo steps kept, `None` for unbounded.
    pub history_limit: Option<usize>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Handle hit radius in screen pixels.
    pub handle_tolerance: f64,
    /// Distance of the rotate handle above the top edge, in screen pixels.
    pub rotate_handle_offset: f64,
    /// Smallest width or height a gesture may produce.
    pub min_layer_size: f64,
    /// Always keep the aspect ratio when scaling image layers from a corner.
    pub lock_image_aspect: bool,
    /// Rotation step used while Shift is held.
    pub rotation_snap_degrees: f64,
    pub selection_color: RgbaColor,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_DOCUMENT_SIZE,
            canvas_height: DEFAULT_DOCUMENT_SIZE,
            background_color: RgbaColor::white(),
            history_limit: None,
            min_zoom: 0.1,
            max_zoom: 10.0,
            handle_tolerance: 8.0,
            rotate_handle_offset: 25.0,
            min_layer_size: 1.0,
            lock_image_aspect: true,
            rotation_snap_degrees: 15.0,
            selection_color: RgbaColor::rgb(59, 130, 246),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded editor config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Replace out-of-range values with usable ones.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.canvas_width = self.canvas_width.max(1);
        self.canvas_height = self.canvas_height.max(1);
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            self.max_zoom = defaults.max_zoom.max(self.min_zoom);
        }
        if !(self.handle_tolerance.is_finite() && self.handle_tolerance >= 0.0) {
            self.handle_tolerance = defaults.handle_tolerance;
        }
        if !(self.rotate_handle_offset.is_finite() && self.rotate_handle_offset >= 0.0) {
            self.rotate_handle_offset = defaults.rotate_handle_offset;
        }
        if !(self.min_layer_size.is_finite() && self.min_layer_size >= 1.0) {
            self.min_layer_size = defaults.min_layer_size;
        }
        if !(self.rotation_snap_degrees.is_finite() && self.rotation_snap_degrees > 0.0) {
            self.rotation_snap_degrees = defaults.rotation_snap_degrees;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r##"{"canvas_width": 800, "background_color": "#000"}"##)
            .unwrap();
        assert_eq!(config.canvas_width, 800);
        assert_eq!(config.canvas_height, DEFAULT_DOCUMENT_SIZE);
        assert_eq!(config.background_color, RgbaColor::black());
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn test_sanitize_bad_values() {
        let config = EditorConfig {
            canvas_width: 0,
            min_zoom: -1.0,
            max_zoom: f64::NAN,
            min_layer_size: 0.0,
            ..EditorConfig::default()
        }
        .sanitized();
        assert_eq!(config.canvas_width, 1);
        assert!((config.min_zoom - 0.1).abs() < f64::EPSILON);
        assert!((config.max_zoom - 10.0).abs() < f64::EPSILON);
        assert!((config.min_layer_size - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"history_limit": 20}}"#).unwrap();
        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.history_limit, Some(20));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            EditorConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
