//! The adapter-normalized streaming unit.

use serde::{Deserialize, Serialize};

/// One unit of backend output, normalized across adapter kinds.
///
/// A well-formed chunk sequence is zero or more `Delta`s terminated by
/// exactly one `Complete`. `Complete` carries the full accumulated text,
/// not the last fragment; adapters track an accumulator across deltas
/// because the upstream terminal event may or may not repeat the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum BackendChunk {
    /// An incremental text fragment, to be appended in order.
    Delta(String),
    /// The terminal chunk carrying the complete accumulated text.
    Complete(String),
}

impl BackendChunk {
    /// The chunk's text payload.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Delta(text) | Self::Complete(text) => text,
        }
    }

    /// Whether this is the terminal chunk.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_accessors() {
        let delta = BackendChunk::Delta("frag".to_string());
        assert_eq!(delta.text(), "frag");
        assert!(!delta.is_complete());

        let complete = BackendChunk::Complete("full text".to_string());
        assert_eq!(complete.text(), "full text");
        assert!(complete.is_complete());
    }

    #[test]
    fn test_chunk_serialize() {
        let json = serde_json::to_string(&BackendChunk::Delta("hi".to_string())).unwrap();
        assert_eq!(json, r#"{"type":"delta","text":"hi"}"#);
    }
}
