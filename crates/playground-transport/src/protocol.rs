//! Wire protocol for the backend socket.
//!
//! Inbound frames are JSON envelopes tagged by `kind`; outbound frames are the
//! bare source text with no envelope.

use playground_core::InboundMessage;

/// Decode one inbound text frame.
///
/// Malformed envelopes are logged and dropped. Unknown kinds decode to
/// [`InboundMessage::Unknown`].
#[must_use]
pub fn decode(text: &str) -> Option<InboundMessage> {
    match serde_json::from_str(text) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!("Invalid backend message: {e}");
            None
        }
    }
}

/// Encode a run request.
#[must_use]
pub fn encode(source: &str) -> String {
    source.to_string()
}
