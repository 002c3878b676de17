//! Core data types: conversation turns, chunks, and ingestion records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use docudialogue_index::ChunkMetadata;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human asking questions
    User,
    /// The model answering them
    Assistant,
}

impl Role {
    /// Canonical wire name ("user" / "assistant")
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry in the conversation history.
///
/// History is append-only for the lifetime of a session: turns are never
/// edited or reordered, only cleared wholesale by an explicit reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A bounded passage of document text, the retrieval unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique id, derived as `{document}-{seq}`
    pub id: String,
    /// Identifier of the owning document
    pub document: String,
    /// Zero-based page the text came from
    pub page: usize,
    /// Sequence index within the document
    pub seq: usize,
    /// Raw text, never empty
    pub text: String,
}

impl Chunk {
    /// Create a chunk, deriving its id from the document and sequence index.
    pub fn new(document: &str, page: usize, seq: usize, text: String) -> Self {
        Self {
            id: format!("{document}-{seq}"),
            document: document.to_string(),
            page,
            seq,
            text,
        }
    }

    /// Attribution metadata stored alongside the embedding.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            source: self.document.clone(),
            page: self.page,
        }
    }
}

/// Registry entry for an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identifier (name or path)
    pub name: String,
    /// Number of pages the document supplied
    pub pages: usize,
    /// Number of chunks written to the index
    pub chunk_count: usize,
    /// Ingestion timestamp
    pub ingested_at: DateTime<Utc>,
}

/// Outcome of an ingestion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    /// Chunks added to the index; 0 for an idempotent no-op
    pub chunks_added: usize,
}
