//! Pointer gesture state machine: idle, move, scale, rotate, pan, multi-touch.
//!
//! Every pointer move applies the delta since the gesture began to the
//! snapshot recorded on press and dispatches a history-exempt update. Release
//! commits once through [`Editor::commit_continuous_edit`].

use crate::editor::Editor;
use crate::input::{MouseButton, PointerEvent, PointerId};
use crate::layers::{Layer, LayerId, LayerKind};
use crate::selection::{self, HandleKind};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Active canvas tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    /// Select, move and transform layers.
    #[default]
    Select,
    /// Drag to pan the viewport.
    Pan,
}

/// Layer targeted by a gesture, with its pre-gesture snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTarget {
    pub id: LayerId,
    pub original: Layer,
}

/// The gesture in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Move {
        target: GestureTarget,
        /// Pointer position at press, document space.
        start: Point,
    },
    Scale {
        target: GestureTarget,
        handle: HandleKind,
        start: Point,
        /// Aspect lock captured at press.
        keep_aspect: bool,
    },
    Rotate {
        target: GestureTarget,
        pivot: Point,
        start: Point,
    },
    Pan {
        /// Pointer position at press, screen space.
        start: Point,
        initial_pan: Vec2,
    },
    MultiTouch {
        pointers: [PointerId; 2],
        /// Layer being pinched, if the interrupted gesture had one.
        target: Option<GestureTarget>,
        /// Layer state when the second pointer went down.
        base: Option<Layer>,
        initial_distance: f64,
        initial_angle: f64,
        initial_mid: Point,
        initial_pan: Vec2,
        initial_zoom: f64,
    },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Move { .. } => "move",
            InteractionState::Scale { .. } => "scale",
            InteractionState::Rotate { .. } => "rotate",
            InteractionState::Pan { .. } => "pan",
            InteractionState::MultiTouch { .. } => "multitouch",
        }
    }

    fn target(&self) -> Option<&GestureTarget> {
        match self {
            InteractionState::Move { target, .. }
            | InteractionState::Scale { target, .. }
            | InteractionState::Rotate { target, .. } => Some(target),
            InteractionState::MultiTouch { target, .. } => target.as_ref(),
            InteractionState::Pan { .. } => None,
        }
    }
}

/// Tracks pointers and the current gesture.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: Option<InteractionState>,
    /// Pressed pointers in press order, screen positions.
    pointers: Vec<(PointerId, Point)>,
    /// Pointer driving a single-pointer gesture.
    primary: Option<PointerId>,
}

impl InteractionController {
    pub fn state(&self) -> Option<&InteractionState> {
        self.state.as_ref()
    }

    /// Feed one pointer event. Returns true if the document or viewport changed.
    pub fn handle_event(&mut self, editor: &mut Editor, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                pointer,
                position,
                button,
                modifiers,
            } => {
                self.track(pointer, position);
                if self.state.is_some() {
                    return self.begin_multitouch(editor);
                }
                self.begin(editor, pointer, position, button, modifiers.shift)
            }
            PointerEvent::Move {
                pointer,
                position,
                modifiers,
            } => {
                self.track(pointer, position);
                self.update(editor, pointer, position, modifiers.shift)
            }
            PointerEvent::Up { pointer, .. } | PointerEvent::Leave { pointer } => {
                let involved = self.involves(pointer);
                self.pointers.retain(|(id, _)| *id != pointer);
                if involved { self.finish(editor) } else { false }
            }
        }
    }

    fn track(&mut self, pointer: PointerId, position: Point) {
        match self.pointers.iter_mut().find(|(id, _)| *id == pointer) {
            Some(entry) => entry.1 = position,
            None => self.pointers.push((pointer, position)),
        }
    }

    fn position_of(&self, pointer: PointerId) -> Option<Point> {
        self.pointers
            .iter()
            .find(|(id, _)| *id == pointer)
            .map(|(_, p)| *p)
    }

    fn involves(&self, pointer: PointerId) -> bool {
        match &self.state {
            Some(InteractionState::MultiTouch { pointers, .. }) => pointers.contains(&pointer),
            Some(_) => self.primary == Some(pointer),
            None => false,
        }
    }

    fn set_state(&mut self, state: Option<InteractionState>) {
        match &state {
            Some(next) => log::debug!("gesture -> {}", next.name()),
            None => log::debug!("gesture -> idle"),
        }
        self.state = state;
    }

    fn begin(
        &mut self,
        editor: &mut Editor,
        pointer: PointerId,
        screen: Point,
        button: MouseButton,
        shift: bool,
    ) -> bool {
        let point = editor.viewport.screen_to_document(screen);

        if button == MouseButton::Middle || editor.tool == Tool::Pan {
            self.primary = Some(pointer);
            let initial_pan = editor.viewport.pan;
            self.set_state(Some(InteractionState::Pan {
                start: screen,
                initial_pan,
            }));
            return false;
        }
        if button != MouseButton::Left {
            return false;
        }

        let config = editor.config();
        let tolerance = editor.viewport.screen_length(config.handle_tolerance);
        let rotate_offset = editor.viewport.screen_length(config.rotate_handle_offset);
        let lock_image_aspect = config.lock_image_aspect;

        if let Some(layer) = editor.selected_layer().filter(|l| l.is_visible && !l.is_locked) {
            if let Some(handle) = selection::hit_test_handles(layer, point, tolerance, rotate_offset) {
                let target = GestureTarget {
                    id: layer.id(),
                    original: layer.clone(),
                };
                let state = match handle {
                    HandleKind::Rotate => InteractionState::Rotate {
                        pivot: layer.center(),
                        target,
                        start: point,
                    },
                    _ => InteractionState::Scale {
                        keep_aspect: shift
                            || (lock_image_aspect && matches!(layer.kind, LayerKind::Image(_))),
                        target,
                        handle,
                        start: point,
                    },
                };
                self.primary = Some(pointer);
                self.set_state(Some(state));
                return false;
            }
        }

        let hit = editor.document().layer_at(point).cloned();
        match hit {
            Some(layer) => {
                editor.select(layer.id());
                if layer.is_locked {
                    log::debug!("layer {} is locked; selected without gesture", layer.id());
                    return false;
                }
                self.primary = Some(pointer);
                self.set_state(Some(InteractionState::Move {
                    target: GestureTarget {
                        id: layer.id(),
                        original: layer,
                    },
                    start: point,
                }));
            }
            None => editor.clear_selection(),
        }
        false
    }

    /// A second pointer went down during a gesture.
    fn begin_multitouch(&mut self, editor: &mut Editor) -> bool {
        if matches!(self.state, Some(InteractionState::MultiTouch { .. })) || self.pointers.len() < 2 {
            return false;
        }
        let (a, pa) = self.pointers[0];
        let (b, pb) = self.pointers[1];
        let distance = (pb - pa).hypot();
        if distance < f64::EPSILON {
            return false;
        }

        let target = self
            .state
            .as_ref()
            .and_then(InteractionState::target)
            .cloned();
        let base = target
            .as_ref()
            .and_then(|t| editor.document().layer(t.id))
            .cloned();
        self.set_state(Some(InteractionState::MultiTouch {
            pointers: [a, b],
            target,
            base,
            initial_distance: distance,
            initial_angle: (pb.y - pa.y).atan2(pb.x - pa.x),
            initial_mid: pa.midpoint(pb),
            initial_pan: editor.viewport.pan,
            initial_zoom: editor.viewport.zoom,
        }));
        false
    }

    fn update(&mut self, editor: &mut Editor, pointer: PointerId, screen: Point, shift: bool) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        if !matches!(state, InteractionState::MultiTouch { .. }) && self.primary != Some(pointer) {
            return false;
        }
        let point = editor.viewport.screen_to_document(screen);
        let min_size = editor.config().min_layer_size;
        let snap = editor.config().rotation_snap_degrees;

        match state {
            InteractionState::Move { target, start } => {
                let patch = selection::apply_move(&target.original, point - *start);
                editor.update_layer(target.id, &patch, false)
            }
            InteractionState::Scale {
                target,
                handle,
                start,
                keep_aspect,
            } => {
                let patch = selection::apply_scale(
                    &target.original,
                    *handle,
                    *start,
                    point,
                    *keep_aspect || shift,
                    min_size,
                );
                editor.update_layer(target.id, &patch, false)
            }
            InteractionState::Rotate {
                target,
                pivot,
                start,
            } => {
                let rotation = selection::apply_rotation(
                    target.original.rotation,
                    *pivot,
                    *start,
                    point,
                    shift.then_some(snap),
                );
                let patch = crate::layers::LayerPatch {
                    rotation: Some(rotation),
                    ..Default::default()
                };
                editor.update_layer(target.id, &patch, false)
            }
            InteractionState::Pan { start, initial_pan } => {
                let pan = *initial_pan + (screen - *start);
                let changed = editor.viewport.pan != pan;
                editor.viewport.pan = pan;
                changed
            }
            InteractionState::MultiTouch {
                pointers,
                target,
                base,
                initial_distance,
                initial_angle,
                initial_mid,
                initial_pan,
                initial_zoom,
            } => {
                let (Some(pa), Some(pb)) = (self.position_of(pointers[0]), self.position_of(pointers[1]))
                else {
                    return false;
                };
                let ratio = (pb - pa).hypot() / initial_distance;
                let angle_delta = ((pb.y - pa.y).atan2(pb.x - pa.x) - initial_angle).to_degrees();
                let mid = pa.midpoint(pb);

                match (target, base) {
                    (Some(target), Some(base)) => {
                        let patch = selection::apply_pinch(base, ratio, angle_delta, min_size);
                        editor.update_layer(target.id, &patch, false)
                    }
                    _ => {
                        let viewport = &mut editor.viewport;
                        let before = *viewport;
                        viewport.set_zoom_clamped(initial_zoom * ratio);
                        let scale = viewport.zoom / initial_zoom;
                        // Keep the document point under the initial midpoint under the current one.
                        viewport.pan = mid.to_vec2() - (initial_mid.to_vec2() - *initial_pan) * scale;
                        *viewport != before
                    }
                }
            }
        }
    }

    /// End the gesture: commit layer edits once and go idle.
    fn finish(&mut self, editor: &mut Editor) -> bool {
        let state = self.state.take();
        self.primary = None;
        let committed = match state.as_ref().and_then(InteractionState::target) {
            Some(target) => editor.commit_continuous_edit(target.id, &target.original),
            None => false,
        };
        self.set_state(None);
        committed
    }
}
