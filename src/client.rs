// The client context: one explicit object owning all mutable client-side
// state (key table, overlay, snapshot store, transport handle). No globals.

use crate::config;
use crate::effects::EffectsOverlay;
use crate::input::{InputSampler, Key};
use crate::render::{DrawSurface, Renderer};
use crate::snapshot::SnapshotStore;
use crate::transport::{
    ClientStatus, ConnectionState, Connector, ReconnectPolicy, TransportHandle, TransportManager,
};
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub enum ClientError {
    // The configured base URL cannot be turned into a WebSocket endpoint.
    InvalidEndpoint(String),
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidEndpoint(e.to_string())
    }
}

/// Build the connection target `/ws/{server_id}/{player_id}` from the hosting
/// base URL, upgrading to `wss` when the base is served securely.
pub fn endpoint(base: &str, server_id: &str, player_id: &str) -> Result<Url, ClientError> {
    let base = Url::parse(base)?;
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let mut endpoint = base;
    endpoint
        .set_scheme(scheme)
        .map_err(|_| ClientError::InvalidEndpoint(format!("cannot use scheme {scheme}")))?;
    endpoint.set_path(&format!("/ws/{server_id}/{player_id}"));
    Ok(endpoint)
}

pub struct ClientConfig {
    pub base_url: String,
    pub server_id: String,
    pub player_id: String,
    pub policy: ReconnectPolicy,
    pub heartbeat_interval: Duration,
    pub tick_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: config::server_base_url(),
            server_id: config::server_id(),
            player_id: config::player_id(),
            policy: ReconnectPolicy::default(),
            heartbeat_interval: config::HEARTBEAT_INTERVAL,
            tick_interval: config::TICK_INTERVAL,
        }
    }
}

pub struct GameClient {
    player_id: String,
    store: SnapshotStore,
    transport: TransportHandle,
    sampler: InputSampler,
    overlay: EffectsOverlay,
    renderer: Renderer,
    tick_interval: Duration,
}

impl GameClient {
    /// Wire up the client and spawn its transport task.
    pub fn connect(config: ClientConfig, connector: Box<dyn Connector>) -> Result<Self, ClientError> {
        let endpoint = endpoint(&config.base_url, &config.server_id, &config.player_id)?;
        let store = SnapshotStore::new();
        let transport = TransportManager::spawn(
            connector,
            endpoint,
            config.policy,
            config.heartbeat_interval,
            store.clone(),
        );
        Ok(Self {
            player_id: config.player_id,
            store,
            transport,
            sampler: InputSampler::default(),
            overlay: EffectsOverlay::new(),
            renderer: Renderer::default(),
            tick_interval: config.tick_interval,
        })
    }

    pub fn key_down(&mut self, key: Key) {
        self.sampler.press(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.sampler.release(key);
    }

    pub fn status(&self) -> ClientStatus {
        self.transport.status()
    }

    pub fn player_count(&self) -> usize {
        self.store.player_count()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// One fixed-rate tick: sample input, advance local effects, redraw the
    /// latest snapshot. Never blocks and never panics on partial world state.
    pub fn tick(&mut self, surface: &mut dyn DrawSurface) {
        if let Some(intent) = self.sampler.movement() {
            self.transport.send(intent);
        }

        if self.sampler.action_triggered(self.overlay.is_swinging()) {
            let snapshot = self.store.current();
            let intents = self
                .overlay
                .trigger_action(snapshot.as_deref(), &self.player_id);
            for intent in intents {
                self.transport.send(intent);
            }
        }

        self.overlay.tick();

        let snapshot = self.store.current();
        self.renderer
            .render(surface, snapshot.as_deref(), &self.player_id, &self.overlay);
    }

    /// Drive the tick loop until the connection is terminally lost or the
    /// transport is closed externally.
    pub async fn run(mut self, surface: &mut dyn DrawSurface) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        let mut state_rx = self.transport.state_watch();
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(surface),
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let state = *state_rx.borrow();
                    if matches!(state, ConnectionState::Failed | ConnectionState::Disconnected) {
                        return;
                    }
                }
            }
        }
    }

    /// Shut the client down: cancels the transport timers and releases the
    /// connection.
    pub fn close(&self) {
        self.transport.close();
    }
}
