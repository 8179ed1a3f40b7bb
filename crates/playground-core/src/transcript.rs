//! Append-only log transcript.

use std::collections::VecDeque;

/// Status line appended whenever a run is requested.
pub const STATUS_LINE: &str = "Building image...\n";

/// Transcript of colorized build and run output.
///
/// Unbounded unless a byte limit is set, in which case the oldest chunks are
/// dropped to make room.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    chunks: VecDeque<String>,
    total_bytes: usize,
    limit: Option<usize>,
}

impl Transcript {
    /// Create an unbounded transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript holding at most `limit` bytes of history.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Append a chunk of markup.
    pub fn push(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        let bytes = markup.len();

        if let Some(limit) = self.limit {
            while self.total_bytes.saturating_add(bytes) > limit {
                let Some(front) = self.chunks.pop_front() else {
                    break;
                };
                self.total_bytes = self.total_bytes.saturating_sub(front.len());
            }
        }

        self.chunks.push_back(markup);
        self.total_bytes = self.total_bytes.saturating_add(bytes);
    }

    /// Chunks in append order.
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(String::as_str)
    }

    /// Whole transcript as one markup string.
    #[must_use]
    pub fn to_markup(&self) -> String {
        self.chunks.iter().map(String::as_str).collect()
    }

    /// Number of chunks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Bytes of markup held.
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
