//! The two-gesture drag state machine.
//!
//! Tracks one gesture per mouse button: primary (left, image capture) and
//! secondary (right, OCR capture). Pointer events only move gesture state
//! while the modifier gate is held; the gate is queried per event, never
//! cached. A completed gesture is handed out exactly once through
//! [`DragTracker::take_completed`].
//!
//! The tracker is mutated only by the input pump and read by the render
//! state provider, sharing a `Mutex` so readers never observe a gesture
//! whose corners come from two different drags.

use crate::input::{InputEvent, ModifierGate, PointerEvent, PointerKind};

/// One gesture's pending endpoints.
#[derive(Debug, Default, Clone, Copy)]
struct DragGesture {
    start: Option<PointerEvent>,
    end: Option<PointerEvent>,
}

impl DragGesture {
    fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Takes the (start, end) pair if the gesture satisfies the completion
    /// invariant, resetting both fields in the same step.
    fn take_if_complete(&mut self) -> Option<(PointerEvent, PointerEvent)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end.timestamp > start.timestamp => {
                self.clear();
                Some((start, end))
            }
            _ => None,
        }
    }
}

/// Gestures that completed since the last call to `take_completed`.
#[derive(Debug, Default)]
pub struct CompletedDrags {
    pub primary: Option<(PointerEvent, PointerEvent)>,
    pub secondary: Option<(PointerEvent, PointerEvent)>,
}

/// An in-progress selection rectangle for the overlay: the gesture's start
/// corner and the current cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRect {
    pub start: (i32, i32),
    pub current: (i32, i32),
}

/// Converts the raw input stream into completed drag gestures.
#[derive(Debug, Default)]
pub struct DragTracker {
    primary: DragGesture,
    secondary: DragGesture,
    last_position: Option<(i32, i32)>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one input event through the state machine.
    ///
    /// Key events are ignored here; the gate consumes them separately.
    /// Any pointer event seen with the gate released abandons both
    /// in-progress gestures.
    pub fn on_event(&mut self, event: &InputEvent, gate: &dyn ModifierGate) {
        let InputEvent::Pointer(pointer) = event else {
            return;
        };

        self.last_position = Some((pointer.x, pointer.y));

        if !gate.is_held() {
            self.primary.clear();
            self.secondary.clear();
            return;
        }

        match pointer.kind {
            PointerKind::LeftDown => {
                self.secondary.start = None;
                self.primary.start = Some(*pointer);
            }
            PointerKind::LeftUp => {
                self.secondary.end = None;
                self.primary.end = Some(*pointer);
            }
            PointerKind::RightDown => {
                self.primary.start = None;
                self.secondary.start = Some(*pointer);
            }
            PointerKind::RightUp => {
                self.primary.end = None;
                self.secondary.end = Some(*pointer);
            }
            PointerKind::Move | PointerKind::Wheel => {}
        }
    }

    /// Returns and clears the gestures that completed, at most one per
    /// button. Non-blocking; safe to call once per received event.
    pub fn take_completed(&mut self) -> CompletedDrags {
        CompletedDrags {
            primary: self.primary.take_if_complete(),
            secondary: self.secondary.take_if_complete(),
        }
    }

    /// The last pointer position seen on the hook stream, if any.
    pub fn last_position(&self) -> Option<(i32, i32)> {
        self.last_position
    }

    /// The in-progress rectangles for the overlay, per button. A gesture
    /// shows up here from its down-transition until it completes or is
    /// abandoned.
    pub fn in_progress(&self) -> (Option<DragRect>, Option<DragRect>) {
        let rect = |gesture: &DragGesture| {
            let start = gesture.start?;
            let current = self.last_position?;
            Some(DragRect {
                start: (start.x, start.y),
                current,
            })
        };
        (rect(&self.primary), rect(&self.secondary))
    }
}
