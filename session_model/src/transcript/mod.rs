//! Transcript definitions - the dialogue lines of a recorded session.

use serde::{Deserialize, Serialize};

/// A single line of session dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Position of the line in the session transcript.
    pub line_index: usize,

    /// Display name of the speaker as recorded.
    pub author_name: String,

    pub content: String,

    /// Wall-clock time the line was spoken (epoch milliseconds).
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl TranscriptEntry {
    /// Create a new transcript line.
    pub fn new(line_index: usize, author_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            line_index,
            author_name: author_name.into(),
            content: content.into(),
            timestamp_ms: 0,
        }
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Build a transcript from `(author, content)` pairs, numbering lines in order.
pub fn transcript_from_pairs<A, C>(pairs: impl IntoIterator<Item = (A, C)>) -> Vec<TranscriptEntry>
where
    A: Into<String>,
    C: Into<String>,
{
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, (author, content))| TranscriptEntry::new(i, author, content))
        .collect()
}
