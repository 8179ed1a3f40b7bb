//! Transport layer between the playground client and its backend.
//!
//! Provides:
//! - Wire protocol (JSON envelopes in, bare source text out)
//! - WebSocket connector (feature: websocket)

pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(feature = "websocket")]
pub use websocket::{WsConnection, WsConnector};
