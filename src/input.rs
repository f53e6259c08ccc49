// Fixed-tick input sampling: held-key table in, movement intents out.

use crate::config;
use crate::protocol::Intent;
use std::collections::HashSet;

/// Logical keys the client binds. Each direction has two bindings (arrow key
/// plus WASD) and the action has two (space and E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    W,
    A,
    S,
    D,
    Space,
    E,
}

const UP_BINDINGS: [Key; 2] = [Key::ArrowUp, Key::W];
const DOWN_BINDINGS: [Key; 2] = [Key::ArrowDown, Key::S];
const LEFT_BINDINGS: [Key; 2] = [Key::ArrowLeft, Key::A];
const RIGHT_BINDINGS: [Key; 2] = [Key::ArrowRight, Key::D];
const ACTION_BINDINGS: [Key; 2] = [Key::Space, Key::E];

/// Samples the currently-held key table once per tick.
#[derive(Debug)]
pub struct InputSampler {
    held: HashSet<Key>,
    speed: f64,
    action_was_held: bool,
}

impl InputSampler {
    pub fn new(speed: f64) -> Self {
        Self {
            held: HashSet::new(),
            speed,
            action_was_held: false,
        }
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    fn any_held(&self, bindings: &[Key]) -> bool {
        bindings.iter().any(|key| self.held.contains(key))
    }

    /// Derive this tick's movement intent. A direction counts once no matter
    /// how many of its bindings are held; opposing directions cancel; a zero
    /// vector produces no intent at all.
    pub fn movement(&self) -> Option<Intent> {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.any_held(&UP_BINDINGS) {
            dy -= self.speed;
        }
        if self.any_held(&DOWN_BINDINGS) {
            dy += self.speed;
        }
        if self.any_held(&LEFT_BINDINGS) {
            dx -= self.speed;
        }
        if self.any_held(&RIGHT_BINDINGS) {
            dx += self.speed;
        }
        if dx == 0.0 && dy == 0.0 {
            None
        } else {
            Some(Intent::Move { dx, dy })
        }
    }

    /// Whether the action should fire this tick: only on the not-held → held
    /// edge, and never while a swing is already playing.
    pub fn action_triggered(&mut self, action_in_progress: bool) -> bool {
        let held = self.any_held(&ACTION_BINDINGS);
        let fired = held && !self.action_was_held && !action_in_progress;
        self.action_was_held = held;
        fired
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new(config::MOVE_SPEED)
    }
}
