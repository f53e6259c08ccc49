// Scripted connector/connection pair for driving the transport state machine
// through failures, sessions, and heartbeats without a real server.
#![allow(dead_code)]

use async_trait::async_trait;
use game_client::transport::{Connection, Connector, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use url::Url;

pub fn test_endpoint() -> Url {
    Url::parse("ws://127.0.0.1:9/ws/test/player_test").expect("static test url")
}

/// One scripted inbound step for a session.
pub enum Incoming {
    Text(&'static str),
    Error,
    Close,
}

/// Script for a single successful connection.
pub struct Session {
    pub incoming: Vec<Incoming>,
    /// Outcome per send call, in order; exhausted entries succeed.
    pub send_outcomes: Vec<bool>,
}

impl Session {
    pub fn holding(incoming: Vec<Incoming>) -> Self {
        Self {
            incoming,
            send_outcomes: Vec::new(),
        }
    }
}

pub enum Outcome {
    Fail,
    Open(Session),
}

/// Connector that replays scripted outcomes and records when each connection
/// attempt happened (in virtual time, for backoff assertions).
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Outcome>>,
    connect_times: Arc<Mutex<Vec<Instant>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            connect_times: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always_fail() -> Self {
        Self::new(Vec::new())
    }

    pub fn connect_times(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.connect_times.clone()
    }

    /// Every frame sent over any session opened by this connector.
    pub fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _endpoint: &Url) -> Result<Box<dyn Connection>, TransportError> {
        self.connect_times.lock().unwrap().push(Instant::now());
        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            // An empty or exhausted script keeps failing.
            None | Some(Outcome::Fail) => Err(TransportError::Closed),
            Some(Outcome::Open(session)) => Ok(Box::new(ScriptedConnection {
                incoming: VecDeque::from(session.incoming),
                send_outcomes: VecDeque::from(session.send_outcomes),
                sent: self.sent.clone(),
            })),
        }
    }
}

struct ScriptedConnection {
    incoming: VecDeque<Incoming>,
    send_outcomes: VecDeque<bool>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.send_outcomes.pop_front().unwrap_or(true) {
            self.sent.lock().unwrap().push(text);
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        match self.incoming.pop_front() {
            Some(Incoming::Text(text)) => Some(Ok(text.to_string())),
            Some(Incoming::Error) => Some(Err(TransportError::Closed)),
            Some(Incoming::Close) => None,
            // Script exhausted: stay quiet so the session lives until the
            // test closes it or a timer fires.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}
