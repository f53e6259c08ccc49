// Local-only, unconfirmed visual state: the swing animation and optimistic
// collection particles. Nothing here is authoritative; the server is free to
// reject a collection and these effects play out regardless.

use crate::config;
use crate::protocol::Intent;
use crate::snapshot::{ResourceKind, Snapshot};

/// One optimistic collection particle, anchored where the resource was.
/// Progress is derived from an integer tick age so expiry is exact.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEffect {
    pub kind: ResourceKind,
    pub origin_x: f64,
    pub origin_y: f64,
    age: u32,
}

impl LocalEffect {
    /// Animation progress in `[0, 1)`.
    pub fn progress(&self) -> f64 {
        f64::from(self.age) * config::EFFECT_STEP
    }
}

/// Tracks short-lived client-side visual state, advanced once per tick.
#[derive(Debug, Default)]
pub struct EffectsOverlay {
    // Swing arm angle, 0..SWING_SWEEP while a swing is playing.
    swing: Option<f64>,
    effects: Vec<LocalEffect>,
}

impl EffectsOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_swinging(&self) -> bool {
        self.swing.is_some()
    }

    pub fn swing_angle(&self) -> Option<f64> {
        self.swing
    }

    pub fn effects(&self) -> &[LocalEffect] {
        &self.effects
    }

    /// Begin a swing and optimistically collect everything in reach.
    ///
    /// Scans the current snapshot for resources within `REACH_RADIUS` of the
    /// local player; each hit yields one `Collect` intent for the caller to
    /// send and one local particle anchored at the resource. Best-effort UX
    /// approximation: the particle plays whether or not the server accepts.
    pub fn trigger_action(&mut self, snapshot: Option<&Snapshot>, player_id: &str) -> Vec<Intent> {
        self.swing = Some(0.0);

        let mut intents = Vec::new();
        let Some(snapshot) = snapshot else {
            return intents;
        };
        let Some(player) = snapshot.players.get(player_id) else {
            return intents;
        };

        for resource in &snapshot.resources {
            let dist = ((player.x - resource.x).powi(2) + (player.y - resource.y).powi(2)).sqrt();
            if dist < config::REACH_RADIUS {
                intents.push(Intent::Collect {
                    resource_id: resource.id.clone(),
                });
                self.effects.push(LocalEffect {
                    kind: resource.kind,
                    origin_x: resource.x,
                    origin_y: resource.y,
                    age: 0,
                });
            }
        }
        intents
    }

    /// Advance all local animations by one tick. The swing ends once its arc
    /// completes; particles are dropped once progress reaches 1.
    pub fn tick(&mut self) {
        if let Some(angle) = self.swing.as_mut() {
            *angle += config::SWING_STEP;
            if *angle >= config::SWING_SWEEP {
                self.swing = None;
            }
        }

        for effect in &mut self.effects {
            effect.age += 1;
        }
        self.effects.retain(|effect| effect.progress() < 1.0);
    }
}
