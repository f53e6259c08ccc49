pub mod client;
pub mod config;
pub mod effects;
pub mod input;
pub mod protocol;
pub mod render;
pub mod snapshot;
pub mod transport;

pub use client::{ClientConfig, GameClient};
pub use transport::{ClientStatus, ConnectionState, WsConnector};
