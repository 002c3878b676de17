//! docudialogue-index: in-memory vector index for the DocuDialogue RAG core
//!
//! Stores (chunk id, embedding, text, metadata) entries and answers
//! nearest-neighbor queries by cosine similarity. The index enforces a fixed
//! embedding dimensionality, guarantees chunk-id uniqueness, and supports
//! single-writer/multiple-reader access.

pub mod error;
mod index;

pub use error::{IndexError, Result};
pub use index::{ChunkMetadata, IndexEntry, SearchHit, VectorIndex};
