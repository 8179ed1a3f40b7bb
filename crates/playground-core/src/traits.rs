//! Core traits for the backend connection and the front end.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{Effect, InboundMessage, SessionClient};

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Socket is being opened.
    Connecting,
    /// Socket is open and delivering messages.
    Open,
    /// Socket closed or failed.
    Closed,
}

/// Connection error.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("Connection closed")]
    Closed,
}

/// One open connection to the build/run backend.
#[async_trait]
pub trait Connection: Send {
    /// Queue a run request. Fire-and-forget: there is no acknowledgement.
    ///
    /// # Errors
    /// Returns error if the connection is already closed.
    fn send(&self, source: String) -> Result<(), ConnectionError>;

    /// Next backend message, in arrival order.
    ///
    /// Returns `None` once the connection has closed. Must be cancel-safe:
    /// callers race it against user input in `select!`.
    async fn recv(&mut self) -> Option<InboundMessage>;
}

/// Opens connections to the backend.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    /// Connect to `target`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached.
    async fn connect(&self, target: &Url) -> Result<Self::Connection, ConnectionError>;
}

/// Front end that renders session state.
///
/// Implement this to wire the client into a UI; effects arrive in the order
/// the client produced them.
pub trait Frontend: Send {
    /// Perform one effect. `client` reflects state after the triggering event.
    fn apply(&mut self, effect: &Effect, client: &SessionClient);

    /// Connection state changed.
    fn connection_changed(&mut self, _state: ConnectionState) {}
}
