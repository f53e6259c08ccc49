// Domain-level world state as seen by the client.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Resource categories known to the client. Unknown wire values fold into
/// `Other` so new server-side kinds never break rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Wood,
    Stone,
    Food,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub x: f64,
    pub y: f64,
    pub health: f64,
    pub hunger: f64,
    pub inventory: Vec<ResourceKind>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub kind: ResourceKind,
}

/// A complete, self-contained description of the world at one instant.
/// Snapshots are never merged; each inbound frame replaces the whole thing.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub players: HashMap<String, PlayerView>,
    pub resources: Vec<ResourceView>,
    pub map_size: f64,
}

/// Holds the single latest authoritative snapshot.
///
/// Backed by a watch channel: `replace` publishes a new `Arc<Snapshot>` as one
/// value, so a reader always sees either the previous frame or the next one,
/// never a mix of the two.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Option<Arc<Snapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Atomically swap in a new snapshot.
    pub fn replace(&self, snapshot: Snapshot) {
        let _ = self.tx.send(Some(Arc::new(snapshot)));
    }

    /// The latest snapshot, or `None` before the first frame arrives.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.tx.borrow().clone()
    }

    /// Live player count for the status surface; zero before the first frame.
    pub fn player_count(&self) -> usize {
        self.tx
            .borrow()
            .as_ref()
            .map(|snap| snap.players.len())
            .unwrap_or(0)
    }

    /// Subscribe to snapshot replacements (used by render-on-change callers).
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
