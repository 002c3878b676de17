//! Application state wiring the pipeline together

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use docudialogue_index::VectorIndex;
use parking_lot::RwLock;

use crate::chat::{ChatSession, SessionState, TokenStream};
use crate::config::{BackendConfig, RagConfig};
use crate::embeddings::{EmbeddingProvider, OllamaEmbedder};
use crate::error::Result;
use crate::ingestion::{IngestionPipeline, PageExtractor};
use crate::retrieval::{RetrievedContext, Retriever};
use crate::types::{DocumentRecord, IngestResult, Turn};

/// Shared application state.
///
/// This is the explicit session/context object the display surface works
/// with: it owns the index handle, the processed-document registry (via the
/// ingestion pipeline), the conversation history (via the chat session), and
/// the active backend configuration. Nothing in the core reads global state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    index: Arc<VectorIndex>,
    pipeline: IngestionPipeline,
    retriever: Arc<Retriever>,
    session: ChatSession,
    backend: RwLock<Option<BackendConfig>>,
}

impl AppState {
    /// Wire up the pipeline around an embedding provider.
    ///
    /// The index dimensionality is taken from the provider, so every entry
    /// and every query vector agree by construction.
    pub fn new(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        tracing::info!(
            embedder = embedder.name(),
            dimensions = embedder.dimensions(),
            "initializing RAG state"
        );
        let index = Arc::new(VectorIndex::new(embedder.dimensions())?);
        let pipeline = IngestionPipeline::new(
            &config.chunking,
            Arc::clone(&embedder),
            Arc::clone(&index),
        );
        let retriever = Arc::new(Retriever::new(
            &config.retrieval,
            Arc::clone(&embedder),
            Arc::clone(&index),
        ));
        let session = ChatSession::new(Arc::clone(&retriever));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                pipeline,
                retriever,
                session,
                backend: RwLock::new(None),
            }),
        })
    }

    /// Convenience constructor using the configured Ollama embedder.
    pub fn with_ollama(config: RagConfig) -> Result<Self> {
        let embedder = Arc::new(OllamaEmbedder::new(&config.embedding)?);
        Self::new(config, embedder)
    }

    /// Configuration this state was built with.
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// The underlying vector index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.inner.index
    }

    /// The retriever, for callers that want raw ranked results.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.inner.retriever
    }

    /// Ingest a document's pages under the given identifier.
    pub async fn ingest(&self, document: &str, pages: &[String]) -> Result<IngestResult> {
        self.inner.pipeline.ingest(document, pages).await
    }

    /// Extract and ingest a file through a page extractor.
    pub async fn ingest_file(
        &self,
        extractor: &dyn PageExtractor,
        path: &Path,
    ) -> Result<IngestResult> {
        self.inner.pipeline.ingest_file(extractor, path).await
    }

    /// Reconcile indexed documents against the currently uploaded set.
    ///
    /// The display surface calls this whenever the active document set
    /// changes; documents that disappeared are removed from the index.
    pub fn sync(&self, current: &HashSet<String>) -> Vec<String> {
        self.inner.pipeline.sync(current)
    }

    /// Registry records for every ingested document.
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.inner.pipeline.documents()
    }

    /// Whether a document is already indexed.
    pub fn is_processed(&self, document: &str) -> bool {
        self.inner.pipeline.is_processed(document)
    }

    /// Drop all documents, index entries, and registry state.
    pub fn reset_documents(&self) {
        self.inner.pipeline.reset();
    }

    /// Retrieve context for a query without starting a generation.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        self.inner.retriever.retrieve(query).await
    }

    /// Cross-check index invariants; fatal when they do not hold.
    pub fn verify_index(&self) -> Result<()> {
        self.inner.index.verify().map_err(Into::into)
    }

    /// Set the active backend configuration (model, key, sampling).
    pub fn set_backend(&self, config: BackendConfig) {
        *self.inner.backend.write() = Some(config);
    }

    /// The active backend configuration, if one was set.
    pub fn backend(&self) -> Option<BackendConfig> {
        self.inner.backend.read().clone()
    }

    /// Send a user message through the active backend.
    pub async fn send(&self, user_text: &str) -> Result<TokenStream> {
        let config = self
            .backend()
            .ok_or_else(|| crate::Error::config("no backend configured"))?;
        self.inner.session.send(user_text, &config).await
    }

    /// Send a user message through an explicit backend configuration.
    pub async fn send_with(
        &self,
        user_text: &str,
        config: &BackendConfig,
    ) -> Result<TokenStream> {
        self.inner.session.send(user_text, config).await
    }

    /// Snapshot of the conversation history.
    pub fn history(&self) -> Vec<Turn> {
        self.inner.session.history()
    }

    /// Current conversation state.
    pub fn session_state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Clear the conversation history.
    pub fn clear_chat(&self) -> Result<()> {
        self.inner.session.clear()
    }
}
