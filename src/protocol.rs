// Wire protocol DTOs and conversions for client/server messages.

use crate::snapshot::{PlayerView, ResourceKind, ResourceView, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Messages the client sends to the server over the WebSocket.
///
/// Intents are fire-and-forget: a dropped one is superseded by the next tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Intent {
    // Desired movement for this tick, in world units.
    Move { dx: f64, dy: f64 },
    // Request to pick up one resource. The canonical wire field is
    // `resource_id`; the bare `id` spelling seen in older clients is not sent.
    Collect { resource_id: String },
    // Liveness probe; the server answers with a pong frame.
    #[serde(rename = "ping")]
    Heartbeat,
}

/// A parsed inbound frame: either a heartbeat acknowledgement (consumed by the
/// transport) or a full world snapshot (forwarded to the store).
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Pong,
    Snapshot(Snapshot),
}

// Control frames carry a `type` tag; snapshots do not, so control parsing is
// attempted first and a failure falls through to the snapshot shape.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ControlFrame {
    Pong,
}

/// Snapshot shape as sent by the server. `players` and `resources` are
/// required: a frame without them is unknown state, not an empty world, and
/// is rejected so the previous snapshot stays in place.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotDto {
    pub players: HashMap<String, PlayerViewDto>,
    pub resources: Vec<ResourceDto>,
    #[serde(default = "default_map_size")]
    pub map_size: f64,
}

fn default_map_size() -> f64 {
    1000.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerViewDto {
    pub x: f64,
    pub y: f64,
    #[serde(default = "full_meter")]
    pub health: f64,
    #[serde(default = "full_meter")]
    pub hunger: f64,
    #[serde(default)]
    pub inventory: Vec<ResourceKind>,
    #[serde(default)]
    pub color: Option<String>,
}

fn full_meter() -> f64 {
    100.0
}

const DEFAULT_PLAYER_COLOR: &str = "#3498db";

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDto {
    pub id: String,
    pub x: f64,
    pub y: f64,
    // Resource kind travels as `type` on the wire.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

impl From<SnapshotDto> for Snapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            players: dto
                .players
                .into_iter()
                .map(|(id, player)| (id, player.into()))
                .collect(),
            resources: dto.resources.into_iter().map(ResourceView::from).collect(),
            map_size: dto.map_size,
        }
    }
}

impl From<PlayerViewDto> for PlayerView {
    fn from(dto: PlayerViewDto) -> Self {
        Self {
            x: dto.x,
            y: dto.y,
            health: dto.health,
            hunger: dto.hunger,
            inventory: dto.inventory,
            color: dto.color.unwrap_or_else(|| DEFAULT_PLAYER_COLOR.to_string()),
        }
    }
}

impl From<ResourceDto> for ResourceView {
    fn from(dto: ResourceDto) -> Self {
        Self {
            id: dto.id,
            x: dto.x,
            y: dto.y,
            kind: dto.kind,
        }
    }
}

/// Parse one inbound text frame. Returns an error for malformed frames; the
/// caller logs and drops those without touching any state.
pub fn parse_frame(text: &str) -> Result<InboundFrame, serde_json::Error> {
    if let Ok(ControlFrame::Pong) = serde_json::from_str::<ControlFrame>(text) {
        return Ok(InboundFrame::Pong);
    }
    let dto = serde_json::from_str::<SnapshotDto>(text)?;
    Ok(InboundFrame::Snapshot(dto.into()))
}
