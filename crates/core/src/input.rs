//! Normalized input events and the modifier-gate capability.
//!
//! Platform hooks deliver raw mouse and keyboard callbacks; the binary
//! normalizes them into [`InputEvent`] values and feeds them over a channel
//! into the drag tracker. Events arrive in non-decreasing timestamp order
//! per source.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::SystemTime;

/// Pointer event kinds the tracker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    LeftDown,
    LeftUp,
    RightDown,
    RightUp,
    Wheel,
}

/// A single mouse event in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
    /// Wheel delta; zero for non-wheel events.
    pub delta: i32,
    pub timestamp: SystemTime,
}

/// Key transition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Down,
    Up,
}

/// A single keyboard event.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub virtual_key_code: u32,
    pub kind: KeyKind,
    pub timestamp: SystemTime,
}

/// A normalized input event from the global hook stream.
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

impl InputEvent {
    pub fn timestamp(&self) -> SystemTime {
        match self {
            InputEvent::Pointer(p) => p.timestamp,
            InputEvent::Key(k) => k.timestamp,
        }
    }
}

/// Capability the tracker queries on every pointer event to decide whether
/// drag tracking is active. Queried on demand, never cached by the caller.
pub trait ModifierGate: Send + Sync {
    fn is_held(&self) -> bool;
}

/// Gate backed by a set of currently held virtual-key codes, maintained from
/// the same hook stream the tracker consumes.
///
/// The gate holds when every required key code is currently down.
pub struct HeldKeyGate {
    required: Vec<u32>,
    held: Mutex<HashSet<u32>>,
}

impl HeldKeyGate {
    pub fn new(required: Vec<u32>) -> Self {
        Self {
            required,
            held: Mutex::new(HashSet::new()),
        }
    }

    /// Records a key transition. Call for every key event before the
    /// corresponding pointer events are processed.
    pub fn observe(&self, event: &KeyEvent) {
        let mut held = crate::lock_unpoisoned(&self.held);
        match event.kind {
            KeyKind::Down => {
                held.insert(event.virtual_key_code);
            }
            KeyKind::Up => {
                held.remove(&event.virtual_key_code);
            }
        }
    }
}

impl ModifierGate for HeldKeyGate {
    fn is_held(&self) -> bool {
        let held = crate::lock_unpoisoned(&self.held);
        self.required.iter().all(|code| held.contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn key(code: u32, kind: KeyKind) -> KeyEvent {
        KeyEvent {
            virtual_key_code: code,
            kind,
            timestamp: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn gate_requires_all_keys() {
        let gate = HeldKeyGate::new(vec![0xA2, 0xA4]);
        assert!(!gate.is_held());

        gate.observe(&key(0xA2, KeyKind::Down));
        assert!(!gate.is_held());

        gate.observe(&key(0xA4, KeyKind::Down));
        assert!(gate.is_held());

        gate.observe(&key(0xA2, KeyKind::Up));
        assert!(!gate.is_held());
    }

    #[test]
    fn empty_requirement_always_holds() {
        let gate = HeldKeyGate::new(Vec::new());
        assert!(gate.is_held());
    }
}
