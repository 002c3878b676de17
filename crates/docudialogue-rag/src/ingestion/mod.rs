//! Document ingestion: chunk, embed, index

pub mod chunker;
pub mod extract;

pub use chunker::PageChunker;
#[cfg(feature = "pdf")]
pub use extract::PdfExtractor;
pub use extract::PageExtractor;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use docudialogue_index::{IndexEntry, VectorIndex};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::ChunkingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::types::{DocumentRecord, IngestResult};

/// Orchestrates chunking, embedding, and indexing for new documents.
///
/// The pipeline owns the registry of processed documents; re-ingesting a
/// registered document is a no-op, and ingestion of the same document from
/// two tasks is serialized through a per-document mutex so the first call
/// wins and the second observes the registration. Different documents may
/// ingest concurrently.
pub struct IngestionPipeline {
    chunker: PageChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    documents: RwLock<HashMap<String, DocumentRecord>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IngestionPipeline {
    /// Create a pipeline over an index and embedding provider.
    pub fn new(
        chunking: &ChunkingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            chunker: PageChunker::new(chunking),
            embedder,
            index,
            documents: RwLock::new(HashMap::new()),
            locks: DashMap::new(),
        }
    }

    /// Ingest a document's pages.
    ///
    /// Returns `chunks_added = 0` without touching the index when the
    /// document is already registered. On any failure the document stays
    /// unregistered and partial writes are rolled back with a compensating
    /// remove, so a retry starts from a clean slate.
    pub async fn ingest(&self, document: &str, pages: &[String]) -> Result<IngestResult> {
        let lock = self
            .locks
            .entry(document.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if self.documents.read().contains_key(document) {
            tracing::debug!(document, "already ingested, skipping");
            return Ok(IngestResult { chunks_added: 0 });
        }

        let chunks = self.chunker.split(document, pages);
        match self.embed_and_upsert(&chunks).await {
            Ok(()) => {}
            Err(e) => {
                // Compensating remove so no half-indexed document survives
                self.index.remove(document);
                tracing::warn!(document, error = %e, "ingestion failed, rolled back");
                return Err(e);
            }
        }

        let record = DocumentRecord {
            name: document.to_string(),
            pages: pages.len(),
            chunk_count: chunks.len(),
            ingested_at: Utc::now(),
        };
        self.documents.write().insert(document.to_string(), record);
        tracing::info!(document, chunks = chunks.len(), "document ingested");

        Ok(IngestResult {
            chunks_added: chunks.len(),
        })
    }

    /// Extract a file's pages and ingest it under its file name.
    pub async fn ingest_file(
        &self,
        extractor: &dyn PageExtractor,
        path: &Path,
    ) -> Result<IngestResult> {
        let document = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let pages = extractor.extract_pages(path)?;
        self.ingest(&document, &pages).await
    }

    async fn embed_and_upsert(&self, chunks: &[crate::types::Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                chunk_id: chunk.id.clone(),
                vector,
                text: chunk.text.clone(),
                metadata: chunk.metadata(),
            })
            .collect();
        self.index.upsert(entries)?;
        Ok(())
    }

    /// Reconcile the registry with the live document set.
    ///
    /// Every registered document missing from `current` is removed from the
    /// index and unregistered. The comparison is by set contents, so removing
    /// one document while adding another in the same cycle is handled
    /// correctly. Returns the names that were dropped.
    pub fn sync(&self, current: &HashSet<String>) -> Vec<String> {
        let stale: Vec<String> = {
            let documents = self.documents.read();
            documents
                .keys()
                .filter(|name| !current.contains(*name))
                .cloned()
                .collect()
        };

        for name in &stale {
            let removed = self.index.remove(name);
            self.documents.write().remove(name);
            self.locks.remove(name);
            tracing::info!(document = %name, removed, "document dropped from index");
        }
        stale
    }

    /// Whether a document has been ingested.
    pub fn is_processed(&self, document: &str) -> bool {
        self.documents.read().contains_key(document)
    }

    /// Registry records for every ingested document, sorted by name.
    pub fn documents(&self) -> Vec<DocumentRecord> {
        let mut records: Vec<DocumentRecord> =
            self.documents.read().values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Drop every document and index entry.
    pub fn reset(&self) {
        self.index.clear();
        self.documents.write().clear();
        self.locks.clear();
        tracing::info!("ingestion state reset");
    }
}
