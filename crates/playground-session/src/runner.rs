//! Session runner: drives a `SessionClient` over a backend connection.

use std::time::Duration;

use playground_core::{
    Connection, ConnectionError, ConnectionState, Connector, Effect, Frontend, InboundMessage,
    Key, PlaygroundConfig, SessionClient, address::AddressError,
};
use tokio::sync::mpsc;
use url::Url;

use crate::backoff::ExponentialBackoff;

/// Session runner error.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Reconnection gave up after {0} attempts")]
    ReconnectExhausted(u32),
}

/// Action taken by the user in the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Editor contents changed.
    Edit(String),
    /// Run button pressed.
    Run,
    /// Key pressed in the address input.
    AddressKey { key: Key, text: String },
    /// Stop the session.
    Quit,
}

/// Handle for feeding user actions into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<UserAction>,
}

impl SessionHandle {
    /// Send an action to the runner.
    ///
    /// # Errors
    /// Returns error if the runner has stopped.
    pub fn send(&self, action: UserAction) -> Result<(), SendError> {
        self.tx.send(action).map_err(|_| SendError::ChannelClosed)
    }

    /// Replace the editable buffer.
    ///
    /// # Errors
    /// Returns error if the runner has stopped.
    pub fn edit(&self, source: impl Into<String>) -> Result<(), SendError> {
        self.send(UserAction::Edit(source.into()))
    }

    /// Request a run of the current buffer.
    ///
    /// # Errors
    /// Returns error if the runner has stopped.
    pub fn run(&self) -> Result<(), SendError> {
        self.send(UserAction::Run)
    }

    /// Report a key press in the address input.
    ///
    /// # Errors
    /// Returns error if the runner has stopped.
    pub fn address_key(&self, key: Key, text: impl Into<String>) -> Result<(), SendError> {
        self.send(UserAction::AddressKey {
            key,
            text: text.into(),
        })
    }

    /// Stop the session.
    ///
    /// # Errors
    /// Returns error if the runner has stopped.
    pub fn quit(&self) -> Result<(), SendError> {
        self.send(UserAction::Quit)
    }
}

/// Send error.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Channel closed")]
    ChannelClosed,
}

enum Event {
    Inbound(Option<InboundMessage>),
    Action(Option<UserAction>),
}

/// Drives one session: backend messages and user actions are processed one
/// at a time, in arrival order, and every resulting effect is applied to the
/// front end.
pub struct SessionRunner<C, F>
where
    C: Connector,
    F: Frontend,
{
    client: SessionClient,
    connector: C,
    frontend: F,
    actions: mpsc::UnboundedReceiver<UserAction>,
    backoff: Option<ExponentialBackoff>,
}

impl<C, F> SessionRunner<C, F>
where
    C: Connector,
    F: Frontend,
{
    /// Create a runner and the handle that feeds it user actions.
    #[must_use]
    pub fn new(
        client: SessionClient,
        connector: C,
        frontend: F,
        config: &PlaygroundConfig,
    ) -> (Self, SessionHandle) {
        let (tx, actions) = mpsc::unbounded_channel();
        let runner = Self {
            client,
            connector,
            frontend,
            actions,
            backoff: ExponentialBackoff::from_config(config),
        };
        (runner, SessionHandle { tx })
    }

    #[must_use]
    pub const fn client(&self) -> &SessionClient {
        &self.client
    }

    #[must_use]
    pub const fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Consume the runner, returning the client and front end.
    #[must_use]
    pub fn into_parts(self) -> (SessionClient, F) {
        (self.client, self.frontend)
    }

    /// Run until the user quits or every handle is dropped.
    ///
    /// Without a reconnect policy a dropped connection leaves the session
    /// `Closed`; user actions are still processed but run requests are
    /// dropped. With a policy the runner reconnects, keeping buffer,
    /// transcript and sub-path; quitting between attempts ends the session.
    ///
    /// # Errors
    /// Returns error if the first connection fails without a reconnect
    /// policy, or if reconnection attempts are exhausted.
    pub async fn run(&mut self) -> Result<(), RunnerError> {
        let target = self.client.socket_target()?;
        tracing::info!(session = %self.client.id(), %target, "Starting session");

        let mut conn = match self.connect(&target).await {
            Ok(conn) => Some(conn),
            Err(e) if self.backoff.is_some() => {
                tracing::warn!("Initial connection failed: {e}");
                self.set_state(ConnectionState::Closed);
                match self.reconnect(&target).await? {
                    Some(conn) => Some(conn),
                    None => {
                        tracing::info!(session = %self.client.id(), "Session ended while reconnecting");
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                self.set_state(ConnectionState::Closed);
                return Err(e.into());
            }
        };

        loop {
            let event = match conn.as_mut() {
                Some(c) => tokio::select! {
                    // Drain backend messages before user actions.
                    biased;
                    message = c.recv() => Event::Inbound(message),
                    action = self.actions.recv() => Event::Action(action),
                },
                None => Event::Action(self.actions.recv().await),
            };

            match event {
                Event::Inbound(Some(message)) => {
                    let effects = self.client.handle(message);
                    self.apply(effects, conn.as_ref());
                }
                Event::Inbound(None) => {
                    tracing::info!(session = %self.client.id(), "Connection closed");
                    conn = None;
                    self.set_state(ConnectionState::Closed);
                    if self.backoff.is_some() {
                        match self.reconnect(&target).await? {
                            Some(c) => conn = Some(c),
                            None => break,
                        }
                    }
                }
                Event::Action(None | Some(UserAction::Quit)) => break,
                Event::Action(Some(action)) => {
                    let effects = self.on_action(action);
                    self.apply(effects, conn.as_ref());
                }
            }
        }

        tracing::info!(session = %self.client.id(), "Session ended");
        Ok(())
    }

    fn on_action(&mut self, action: UserAction) -> Vec<Effect> {
        match action {
            UserAction::Edit(source) => {
                self.client.edit(source);
                Vec::new()
            }
            UserAction::Run => self.client.run(),
            UserAction::AddressKey { key, text } => self.client.address_key(key, &text),
            UserAction::Quit => Vec::new(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>, conn: Option<&C::Connection>) {
        for effect in &effects {
            if let Effect::Send(source) = effect {
                match conn {
                    Some(conn) => {
                        if let Err(e) = conn.send(source.clone()) {
                            tracing::warn!("Run request dropped: {e}");
                        }
                    }
                    None => {
                        tracing::warn!("Not connected, run request dropped");
                        continue;
                    }
                }
            }
            self.frontend.apply(effect, &self.client);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.client.set_state(state);
        self.frontend.connection_changed(state);
    }

    async fn connect(&mut self, target: &Url) -> Result<C::Connection, ConnectionError> {
        self.set_state(ConnectionState::Connecting);
        let conn = self.connector.connect(target).await?;
        self.set_state(ConnectionState::Open);
        Ok(conn)
    }

    /// Retry until connected. Returns `None` if the user quits or every
    /// handle is dropped while waiting.
    async fn reconnect(&mut self, target: &Url) -> Result<Option<C::Connection>, RunnerError> {
        loop {
            let Some(delay) = self.backoff.as_mut().and_then(ExponentialBackoff::next_delay) else {
                self.set_state(ConnectionState::Closed);
                let attempts = self
                    .backoff
                    .as_ref()
                    .map_or(0, ExponentialBackoff::max_attempts);
                return Err(RunnerError::ReconnectExhausted(attempts));
            };

            tracing::info!(?delay, "Reconnecting");
            if !self.serve_actions_for(delay).await {
                return Ok(None);
            }

            match self.connect(target).await {
                Ok(conn) => {
                    if let Some(backoff) = self.backoff.as_mut() {
                        backoff.reset();
                    }
                    return Ok(Some(conn));
                }
                Err(e) => {
                    tracing::warn!("Reconnect failed: {e}");
                    self.set_state(ConnectionState::Closed);
                }
            }
        }
    }

    /// Process user actions while disconnected until `delay` elapses.
    /// Returns `false` on quit or when every handle is dropped.
    async fn serve_actions_for(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return true,
                action = self.actions.recv() => match action {
                    None | Some(UserAction::Quit) => return false,
                    Some(action) => {
                        let effects = self.on_action(action);
                        self.apply(effects, None);
                    }
                },
            }
        }
    }
}
