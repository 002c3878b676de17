//! Semantic retrieval with source attribution

use std::sync::Arc;

use docudialogue_index::{SearchHit, VectorIndex};

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;

/// The formatted context handed to prompt assembly.
///
/// `Empty` is an explicit marker: callers must not treat a missing context
/// the same as a populated one, because an ungrounded answer has to be
/// signaled to the model and the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextBlock {
    /// Ranked, formatted passages
    Found(String),
    /// The index had nothing relevant (or nothing at all)
    Empty,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        matches!(self, ContextBlock::Empty)
    }
}

/// Result of a retrieval pass: the raw ranked hits plus the context block.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Hits in descending similarity order, at most `top_k`
    pub results: Vec<SearchHit>,
    /// Formatted context, or the explicit empty marker
    pub context: ContextBlock,
}

/// Embeds queries and fetches the top-K most similar chunks.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        config: &RetrievalConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k: config.top_k,
        }
    }

    /// Retrieve context for a query with the configured top-K.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        self.retrieve_top(query, self.top_k).await
    }

    /// Retrieve context for a query, fetching at most `k` hits.
    pub async fn retrieve_top(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        if self.index.is_empty() {
            tracing::debug!("retrieval against empty index");
            return Ok(RetrievedContext {
                results: Vec::new(),
                context: ContextBlock::Empty,
            });
        }

        let vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| crate::Error::embedding("provider returned no vector for query"))?;

        let results = self.index.query(&query_vector, k)?;
        let context = format_context(&results);
        tracing::debug!(hits = results.len(), "retrieved context");

        Ok(RetrievedContext { results, context })
    }
}

/// Format hits as `Document {source} (Page {page}): {text}` blocks in ranked
/// order, separated by blank lines.
fn format_context(results: &[SearchHit]) -> ContextBlock {
    if results.is_empty() {
        return ContextBlock::Empty;
    }
    let block = results
        .iter()
        .map(|hit| {
            format!(
                "Document {} (Page {}): {}",
                hit.metadata.source, hit.metadata.page, hit.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    ContextBlock::Found(block)
}
