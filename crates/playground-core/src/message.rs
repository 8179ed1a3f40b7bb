//! Backend push messages and the effects a dispatch step produces.

use serde::{Deserialize, Serialize};

/// Message pushed by the build/run backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Last-known source for the session.
    Content { payload: String },
    /// Chunk of raw, ANSI-annotated build or run output.
    Log { payload: String },
    /// A program is reachable on `port`.
    Started { port: u16, sandbox: String },
    /// Any kind this client does not know about.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Kind tag, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Content { .. } => "content",
            Self::Log { .. } => "log",
            Self::Started { .. } => "started",
            Self::Unknown => "unknown",
        }
    }
}

/// Side effect a front end performs after the client handled an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The editable buffer was replaced; the editor should re-read it.
    BufferReplaced,
    /// Markup appended to the transcript.
    TranscriptAppended(String),
    /// Run request to send to the backend.
    Send(String),
    /// Keep the transcript scrolled to the bottom.
    ScrollToBottom,
    /// Bring the transcript into view.
    ScrollIntoView,
    /// Point the runnable frame and the address input at this address.
    LoadFrame(String),
    /// Rewrite the visible page address without reloading.
    ReplaceAddress(String),
}

/// Key pressed in the address input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}
