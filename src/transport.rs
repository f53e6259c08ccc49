// Connection lifecycle: connect, heartbeat keepalive, failure detection, and
// bounded exponential-backoff reconnection. All transitions happen inside one
// task-owned state machine; open errors, unexpected closes, recv errors and
// heartbeat send failures all funnel through the same disconnection path.

use crate::protocol::{self, InboundFrame, Intent};
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite};
use tracing::{debug, info, trace, warn};
use url::Url;

#[derive(Debug)]
pub enum TransportError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    Ws(tungstenite::Error),
    Serialization(serde_json::Error),
    Closed,
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        TransportError::Ws(e)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Serialization(e)
    }
}

/// Lifecycle of the connection to the server. Only the transport task moves
/// between states; `Failed` is terminal until the client is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

/// Status surface shown to the hosting UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Online,
    Offline,
    Reconnecting,
    ConnectionLost,
}

impl ClientStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ClientStatus::Online => "Online",
            ClientStatus::Offline => "Offline",
            ClientStatus::Reconnecting => "Reconnecting\u{2026}",
            ClientStatus::ConnectionLost => "Connection lost",
        }
    }
}

/// Reconnection tuning: `delay(n) = min(base * (n + 1), cap)` for the n-th
/// consecutive failure, giving up for good after `max_attempts` retries.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: crate::config::RECONNECT_BASE,
            cap: crate::config::RECONNECT_CAP,
            max_attempts: crate::config::MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Retry counter, owned by the transport task. Reset to zero on every
/// successful open; bumped once per failed cycle.
#[derive(Debug, Default)]
pub struct BackoffState {
    attempts: u32,
}

impl BackoffState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next retry, or `None` once attempts are exhausted.
    /// Consuming the delay counts as one attempt.
    pub fn next_delay(&mut self, policy: &ReconnectPolicy) -> Option<Duration> {
        if self.attempts >= policy.max_attempts {
            return None;
        }
        let delay = policy.base.saturating_mul(self.attempts + 1).min(policy.cap);
        self.attempts += 1;
        Some(delay)
    }
}

/// Opens connections. Abstracted so tests can script outcomes.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Url) -> Result<Box<dyn Connection>, TransportError>;
}

/// One live connection: text frames in and out.
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;
    /// Next inbound text frame; `None` means the peer closed cleanly.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
    async fn close(&mut self);
}

/// Production connector over tokio-tungstenite.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Box<dyn Connection>, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(TransportError::Ws)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(tungstenite::Message::Close(_)) => return None,
                // WS-level ping/pong is handled by tungstenite; the game's own
                // heartbeat travels as text frames.
                Ok(_) => continue,
                Err(e) => return Some(Err(TransportError::Ws(e))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Cloneable handle used by the rest of the client to talk to the transport
/// task and observe its state.
#[derive(Clone)]
pub struct TransportHandle {
    intent_tx: mpsc::Sender<Intent>,
    state_rx: watch::Receiver<ConnectionState>,
    status_rx: watch::Receiver<ClientStatus>,
    shutdown: Arc<Notify>,
}

impl TransportHandle {
    /// Fire-and-forget intent send. A no-op unless currently `Connected`:
    /// intents are perishable, so they are dropped rather than queued.
    pub fn send(&self, intent: Intent) {
        if *self.state_rx.borrow() != ConnectionState::Connected {
            trace!(?intent, "dropping intent while not connected");
            return;
        }
        if let Err(e) = self.intent_tx.try_send(intent) {
            debug!(error = %e, "intent channel full or closed; dropping");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn status(&self) -> ClientStatus {
        *self.status_rx.borrow()
    }

    pub fn status_watch(&self) -> watch::Receiver<ClientStatus> {
        self.status_rx.clone()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Stop the transport task: cancels any pending timer and closes the
    /// connection. No intent is retried after this.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

enum SessionEnd {
    Failure,
    Shutdown,
}

pub struct TransportManager {
    connector: Box<dyn Connector>,
    endpoint: Url,
    policy: ReconnectPolicy,
    heartbeat_interval: Duration,
    store: SnapshotStore,
    backoff: BackoffState,
    intent_rx: mpsc::Receiver<Intent>,
    state_tx: watch::Sender<ConnectionState>,
    status_tx: watch::Sender<ClientStatus>,
    shutdown: Arc<Notify>,
}

impl TransportManager {
    /// Build the manager plus the handle the rest of the client holds. The
    /// caller decides how to run it (usually [`TransportManager::spawn`]).
    pub fn new(
        connector: Box<dyn Connector>,
        endpoint: Url,
        policy: ReconnectPolicy,
        heartbeat_interval: Duration,
        store: SnapshotStore,
    ) -> (Self, TransportHandle) {
        let (intent_tx, intent_rx) = mpsc::channel(crate::config::INTENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (status_tx, status_rx) = watch::channel(ClientStatus::Offline);
        let shutdown = Arc::new(Notify::new());

        let manager = Self {
            connector,
            endpoint,
            policy,
            heartbeat_interval,
            store,
            backoff: BackoffState::default(),
            intent_rx,
            state_tx,
            status_tx,
            shutdown: shutdown.clone(),
        };
        let handle = TransportHandle {
            intent_tx,
            state_rx,
            status_rx,
            shutdown,
        };
        (manager, handle)
    }

    pub fn spawn(
        connector: Box<dyn Connector>,
        endpoint: Url,
        policy: ReconnectPolicy,
        heartbeat_interval: Duration,
        store: SnapshotStore,
    ) -> TransportHandle {
        let (manager, handle) = Self::new(connector, endpoint, policy, heartbeat_interval, store);
        tokio::spawn(manager.run());
        handle
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    fn set_status(&self, status: ClientStatus) {
        let _ = self.status_tx.send(status);
    }

    /// Drive the lifecycle until shutdown or exhausted retries.
    pub async fn run(mut self) {
        self.set_state(ConnectionState::Connecting);
        info!(endpoint = %self.endpoint, "connecting");

        loop {
            let connected = tokio::select! {
                result = self.connector.connect(&self.endpoint) => result,
                _ = self.shutdown.notified() => {
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
            };

            match connected {
                Ok(conn) => {
                    // Successful open: retries start from scratch.
                    self.backoff.reset();
                    self.set_state(ConnectionState::Connected);
                    self.set_status(ClientStatus::Online);
                    info!("connected");

                    match self.run_connected(conn).await {
                        SessionEnd::Shutdown => {
                            self.set_state(ConnectionState::Disconnected);
                            return;
                        }
                        SessionEnd::Failure => {}
                    }
                }
                Err(e) => {
                    warn!(error = ?e, "connection attempt failed");
                }
            }

            // Single disconnection path for open errors, closes, recv errors
            // and heartbeat failures. The heartbeat interval died with the
            // session above; the one reconnect timer is armed right here.
            self.set_status(ClientStatus::Offline);
            match self.backoff.next_delay(&self.policy) {
                Some(delay) => {
                    self.set_state(ConnectionState::Reconnecting);
                    self.set_status(ClientStatus::Reconnecting);
                    info!(
                        attempt = self.backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "reconnecting"
                    );
                    if let SessionEnd::Shutdown = self.wait_backoff(delay).await {
                        self.set_state(ConnectionState::Disconnected);
                        return;
                    }
                    self.set_state(ConnectionState::Connecting);
                }
                None => {
                    self.set_state(ConnectionState::Failed);
                    self.set_status(ClientStatus::ConnectionLost);
                    warn!(
                        attempts = self.backoff.attempts(),
                        "max reconnection attempts reached; giving up"
                    );
                    return;
                }
            }
        }
    }

    /// Sleep out the reconnect delay while staying responsive to shutdown.
    /// Intents arriving meanwhile are perishable and silently dropped.
    async fn wait_backoff(&mut self, delay: Duration) -> SessionEnd {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return SessionEnd::Failure,
                _ = self.shutdown.notified() => return SessionEnd::Shutdown,
                maybe_intent = self.intent_rx.recv() => match maybe_intent {
                    Some(intent) => trace!(?intent, "dropping intent while reconnecting"),
                    // Every handle dropped: nobody is driving the client.
                    None => return SessionEnd::Shutdown,
                }
            }
        }
    }

    /// Serve one live session: route inbound frames, forward intents, and
    /// keep the heartbeat going. Returns on the first failure; the heartbeat
    /// interval is dropped with this frame, never outliving `Connected`.
    async fn run_connected(&mut self, mut conn: Box<dyn Connection>) -> SessionEnd {
        // Anything queued before this session opened is stale, not replayable.
        while self.intent_rx.try_recv().is_ok() {}

        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; consume it so pings
        // start one full period after the open.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    conn.close().await;
                    return SessionEnd::Shutdown;
                }

                incoming = conn.recv() => match incoming {
                    Some(Ok(text)) => self.route_frame(&text),
                    Some(Err(e)) => {
                        warn!(error = ?e, "websocket recv error");
                        return SessionEnd::Failure;
                    }
                    None => {
                        info!("websocket closed by server");
                        return SessionEnd::Failure;
                    }
                },

                maybe_intent = self.intent_rx.recv() => match maybe_intent {
                    Some(intent) => {
                        if let Err(e) = send_intent(conn.as_mut(), &intent).await {
                            warn!(error = ?e, "intent send failed");
                            return SessionEnd::Failure;
                        }
                    }
                    // Every handle dropped: nobody is driving the client.
                    None => {
                        conn.close().await;
                        return SessionEnd::Shutdown;
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(e) = send_intent(conn.as_mut(), &Intent::Heartbeat).await {
                        // A failed ping is a connection failure, immediately.
                        warn!(error = ?e, "heartbeat send failed");
                        return SessionEnd::Failure;
                    }
                }
            }
        }
    }

    /// Route one inbound frame: pong frames are consumed here, anything else
    /// well-formed is a full snapshot. Malformed frames are dropped without
    /// touching the store or the connection state.
    fn route_frame(&self, text: &str) {
        match protocol::parse_frame(text) {
            Ok(InboundFrame::Pong) => trace!("heartbeat acknowledged"),
            Ok(InboundFrame::Snapshot(snapshot)) => self.store.replace(snapshot),
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "failed to parse inbound frame; dropping");
            }
        }
    }
}

async fn send_intent(conn: &mut dyn Connection, intent: &Intent) -> Result<(), TransportError> {
    let text = serde_json::to_string(intent)?;
    conn.send(text).await
}
