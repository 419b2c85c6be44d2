//! Core types for ingested chunks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chunk metadata: string keys to scalar JSON values.
pub type Metadata = serde_json::Map<String, Value>;

/// A piece of document text plus its metadata.
///
/// Metadata is sanitized on construction, so it never holds `null` or
/// empty-string values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata: sanitize_metadata(metadata),
        }
    }

    /// Chunk text trimmed of surrounding whitespace.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed_text().is_empty()
    }
}

/// Drop metadata entries whose value is `null` or an empty string.
pub fn sanitize_metadata(metadata: Metadata) -> Metadata {
    metadata
        .into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .collect()
}

/// A chunk with its embedding and store id, ready to be written.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: String,
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk and its similarity to the query (higher is closer).
pub type ScoredChunk = (Chunk, f32);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_drops_null_and_empty() {
        let metadata = json!({
            "source": "/tmp/a.pdf",
            "author": "",
            "page": null,
            "chunk_index": 0,
            "scanned": false,
            "title": " "
        });
        let Value::Object(map) = metadata else {
            panic!("expected object");
        };

        let sanitized = sanitize_metadata(map);
        assert_eq!(sanitized.len(), 4);
        assert!(sanitized.contains_key("source"));
        assert!(sanitized.contains_key("chunk_index"));
        assert!(sanitized.contains_key("scanned"));
        assert!(sanitized.contains_key("title"));
        assert!(!sanitized.contains_key("author"));
        assert!(!sanitized.contains_key("page"));
    }

    #[test]
    fn test_chunk_new_sanitizes() {
        let mut metadata = Metadata::new();
        metadata.insert("empty".to_string(), json!(""));
        metadata.insert("kept".to_string(), json!("value"));

        let chunk = Chunk::new("text", metadata);
        assert_eq!(chunk.metadata.len(), 1);
        assert_eq!(chunk.metadata["kept"], "value");
    }

    #[test]
    fn test_blank_chunk() {
        assert!(Chunk::new(" \n\t ", Metadata::new()).is_blank());
        assert!(!Chunk::new(" x ", Metadata::new()).is_blank());
    }
}
