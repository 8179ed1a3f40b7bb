//! Session client: the per-tab state machine for one playground session.

use url::Url;
use uuid::Uuid;

use crate::{
    Effect, InboundMessage, Key, PlaygroundConfig,
    address::{Address, AddressError, Location, SandboxId},
    colorize::colorize_log,
    traits::ConnectionState,
    transcript::{STATUS_LINE, Transcript},
};

/// Session identifier, used to correlate log lines.
pub type SessionId = Uuid;

/// Client side of one playground session.
///
/// Owns the editable buffer and transcript. Every event handler mutates that
/// state and returns the effects a front end must perform, in order.
#[derive(Debug, Clone)]
pub struct SessionClient {
    id: SessionId,
    location: Location,
    address: Address,
    socket_path: String,
    state: ConnectionState,
    buffer: String,
    transcript: Transcript,
    first_start: bool,
}

impl SessionClient {
    /// Create a client for the page at `location`.
    #[must_use]
    pub fn new(location: Location, config: &PlaygroundConfig) -> Self {
        let address = Address::from_location(&location, &config.default_sandbox);
        Self {
            id: Uuid::new_v4(),
            location,
            address,
            socket_path: config.socket_path.clone(),
            state: ConnectionState::Connecting,
            buffer: String::new(),
            transcript: Transcript::with_limit(config.transcript_limit),
            first_start: true,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Sandbox selected at session start.
    #[must_use]
    pub fn sandbox(&self) -> &SandboxId {
        self.address.sandbox()
    }

    /// Routing context preserved for derived addresses.
    #[must_use]
    pub fn sub_path(&self) -> &str {
        self.address.sub_path()
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Current editable source.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Backend socket address for this session.
    ///
    /// # Errors
    /// Returns error if the page host cannot form a socket address.
    pub fn socket_target(&self) -> Result<Url, AddressError> {
        self.address.socket_target(&self.location, &self.socket_path)
    }

    /// Record a connection state change.
    pub fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            tracing::debug!(session = %self.id, from = ?self.state, to = ?state, "Connection state changed");
            self.state = state;
        }
    }

    /// Handle one backend message.
    pub fn handle(&mut self, message: InboundMessage) -> Vec<Effect> {
        tracing::debug!(session = %self.id, kind = message.kind(), "Inbound message");

        match message {
            InboundMessage::Content { payload } => {
                self.buffer = payload;
                vec![
                    Effect::BufferReplaced,
                    self.append(STATUS_LINE.to_string()),
                    Effect::Send(self.buffer.clone()),
                ]
            }
            InboundMessage::Log { payload } => {
                vec![self.append(colorize_log(&payload)), Effect::ScrollToBottom]
            }
            InboundMessage::Started { port, sandbox } => self.on_started(port, &sandbox),
            InboundMessage::Unknown => Vec::new(),
        }
    }

    fn on_started(&mut self, port: u16, sandbox: &str) -> Vec<Effect> {
        let frame = self.address.frame_address(&self.location, port);
        let visible = self.address.visible_address(sandbox, &self.location);
        tracing::info!(session = %self.id, %frame, "Program started");

        let mut effects = vec![Effect::LoadFrame(frame), Effect::ReplaceAddress(visible)];
        if self.first_start {
            self.first_start = false;
        } else {
            effects.push(Effect::ScrollIntoView);
        }
        effects
    }

    /// Request a run of the current buffer.
    pub fn run(&mut self) -> Vec<Effect> {
        vec![
            self.append(STATUS_LINE.to_string()),
            Effect::ScrollToBottom,
            Effect::Send(self.buffer.clone()),
        ]
    }

    /// Replace the buffer with user-edited source.
    pub fn edit(&mut self, source: impl Into<String>) {
        self.buffer = source.into();
    }

    /// Key press in the address input holding `text`.
    ///
    /// Enter navigates the runnable frame to `text` verbatim.
    #[must_use]
    pub fn address_key(&self, key: Key, text: &str) -> Vec<Effect> {
        match key {
            Key::Enter => vec![Effect::LoadFrame(text.to_string())],
            _ => Vec::new(),
        }
    }

    fn append(&mut self, markup: String) -> Effect {
        self.transcript.push(markup.clone());
        Effect::TranscriptAppended(markup)
    }
}
