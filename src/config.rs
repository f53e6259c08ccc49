use std::{env, time::Duration};

// Runtime/client constants (not gameplay tuning).

pub fn server_base_url() -> String {
    env::var("GAME_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

pub fn server_id() -> String {
    env::var("GAME_SERVER_ID").unwrap_or_else(|_| "default".to_string())
}

pub fn player_id() -> String {
    env::var("GAME_PLAYER_ID")
        .unwrap_or_else(|_| format!("player_{}", uuid::Uuid::new_v4().simple()))
}

pub const INTENT_CHANNEL_CAPACITY: usize = 256;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

pub const RECONNECT_BASE: Duration = Duration::from_millis(1000);
pub const RECONNECT_CAP: Duration = Duration::from_millis(5000);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

// Movement speed in world units per tick.
pub const MOVE_SPEED: f64 = 5.0;
// Resources within this distance of the local player are collected on a swing.
pub const REACH_RADIUS: f64 = 50.0;

// Swing arm sweeps 0..pi; collection particles live for 1/EFFECT_STEP ticks.
pub const SWING_STEP: f64 = 0.1;
pub const SWING_SWEEP: f64 = std::f64::consts::PI;
pub const EFFECT_STEP: f64 = 0.05;

pub const VIEWPORT_WIDTH: f64 = 800.0;
pub const VIEWPORT_HEIGHT: f64 = 600.0;
pub const MINIMAP_SIZE: f64 = 100.0;
pub const MINIMAP_MARGIN: f64 = 10.0;
