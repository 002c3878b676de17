//! docudialogue-rag: the RAG core behind DocuDialogue
//!
//! This crate implements the retrieval-augmented generation pipeline of a
//! document chat system: ingestion (chunking, embedding, indexing), semantic
//! retrieval with source attribution, grounded prompt assembly, and a
//! conversation orchestrator that streams answers from swappable LLM
//! backends (OpenAI-style and Gemini-style APIs).
//!
//! The display surface, credential storage, and PDF text extraction are
//! external collaborators; the crate consumes them through [`AppState`],
//! [`config::BackendConfig`], and [`ingestion::PageExtractor`].

pub mod chat;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod retrieval;
pub mod state;
pub mod types;

pub use config::{BackendConfig, ModelId, RagConfig, SamplingParams};
pub use error::{Error, Result};
pub use state::AppState;
pub use types::{Chunk, DocumentRecord, IngestResult, Role, Turn};

/// Re-export the index crate for convenience
pub use docudialogue_index;
