//! Integration tests for the ingestion and retrieval pipeline.
//!
//! Everything runs against the deterministic hashing embedder, so results
//! are stable across machines and no model server is required.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docudialogue_rag::embeddings::{EmbeddingProvider, HashEmbedder};
use docudialogue_rag::retrieval::ContextBlock;
use docudialogue_rag::{AppState, Error, RagConfig};

fn test_config() -> RagConfig {
    let mut config = RagConfig::default();
    // Small chunks so multi-chunk documents stay cheap to construct
    config.chunking.chunk_size = 120;
    config.chunking.chunk_overlap = 20;
    config
}

fn state() -> AppState {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    AppState::new(test_config(), Arc::new(HashEmbedder::new(128))).unwrap()
}

fn long_page(topic: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("The {topic} section number {i} describes findings in detail. "))
        .collect()
}

#[tokio::test]
async fn ingest_is_idempotent() {
    let state = state();
    let pages = vec!["Revenue was $5M in 2023.".to_string()];

    let first = state.ingest("report.pdf", &pages).await.unwrap();
    assert_eq!(first.chunks_added, 1);
    let before = state.index().len();

    let second = state.ingest("report.pdf", &pages).await.unwrap();
    assert_eq!(second.chunks_added, 0);
    assert_eq!(state.index().len(), before);
    state.index().verify().unwrap();
}

#[tokio::test]
async fn indexed_text_round_trips_as_top_result() {
    let state = state();
    state
        .ingest(
            "facts.pdf",
            &[
                "Revenue was $5M in 2023.".to_string(),
                "The office relocated to Lisbon last spring.".to_string(),
                "Headcount grew to forty employees.".to_string(),
            ],
        )
        .await
        .unwrap();

    let retrieved = state.retrieve("Revenue was $5M in 2023.").await.unwrap();
    assert_eq!(retrieved.results[0].text, "Revenue was $5M in 2023.");
    assert!(retrieved.results[0].score > 0.99);
}

#[tokio::test]
async fn retrieval_formats_hits_with_source_attribution() {
    let state = state();
    state
        .ingest("report.pdf", &["Revenue was $5M in 2023.".to_string()])
        .await
        .unwrap();

    let retrieved = state.retrieve("What was the revenue?").await.unwrap();
    let ContextBlock::Found(context) = retrieved.context else {
        panic!("expected formatted context");
    };
    assert!(context.starts_with("Document report.pdf (Page 0):"));
    assert!(context.contains("Revenue was $5M in 2023."));
}

#[tokio::test]
async fn empty_index_yields_the_explicit_empty_marker() {
    let state = state();
    let retrieved = state.retrieve("anything at all").await.unwrap();
    assert!(retrieved.results.is_empty());
    assert_eq!(retrieved.context, ContextBlock::Empty);
}

#[tokio::test]
async fn sync_compares_contents_not_sizes() {
    let state = state();
    state
        .ingest("a.pdf", &[long_page("alpha", 20)])
        .await
        .unwrap();
    state
        .ingest("b.pdf", &["The beta document covers something else.".to_string()])
        .await
        .unwrap();

    // One document removed while another appears in the same cycle: the set
    // size is unchanged, but a.pdf must still be dropped.
    let current: HashSet<String> = ["b.pdf".to_string(), "c.pdf".to_string()].into();
    let dropped = state.sync(&current);
    assert_eq!(dropped, vec!["a.pdf".to_string()]);
    assert!(!state.is_processed("a.pdf"));
    assert!(state.is_processed("b.pdf"));

    let retrieved = state.retrieve("alpha section findings").await.unwrap();
    assert!(retrieved
        .results
        .iter()
        .all(|hit| hit.metadata.source != "a.pdf"));
    state.index().verify().unwrap();
}

#[tokio::test]
async fn sync_removal_drops_exactly_the_documents_chunks() {
    let state = state();
    state
        .ingest("big.pdf", &[long_page("gamma", 30)])
        .await
        .unwrap();
    state
        .ingest("small.pdf", &["One tiny page.".to_string()])
        .await
        .unwrap();

    let big_chunks = state
        .documents()
        .iter()
        .find(|d| d.name == "big.pdf")
        .unwrap()
        .chunk_count;
    assert!(big_chunks > 1);

    let before = state.index().len();
    let current: HashSet<String> = ["small.pdf".to_string()].into();
    state.sync(&current);
    assert_eq!(state.index().len(), before - big_chunks);
}

/// Embedder that fails its first call, then behaves normally.
struct FlakyEmbedder {
    inner: HashEmbedder,
    failed_once: AtomicBool,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> docudialogue_rag::Result<Vec<Vec<f32>>> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(Error::EmbeddingUnavailable(
                "model server not responding".to_string(),
            ));
        }
        self.inner.embed(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn failed_ingestion_rolls_back_and_retry_succeeds() {
    let embedder = Arc::new(FlakyEmbedder {
        inner: HashEmbedder::new(128),
        failed_once: AtomicBool::new(false),
    });
    let state = AppState::new(test_config(), embedder).unwrap();
    let pages = vec!["Revenue was $5M in 2023.".to_string()];

    let err = state.ingest("report.pdf", &pages).await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    assert!(!state.is_processed("report.pdf"));
    assert_eq!(state.index().len(), 0);

    let retry = state.ingest("report.pdf", &pages).await.unwrap();
    assert_eq!(retry.chunks_added, 1);
    assert!(state.is_processed("report.pdf"));
    state.index().verify().unwrap();
}

#[tokio::test]
async fn concurrent_ingest_of_the_same_document_runs_once() {
    let state = state();
    let pages = vec![long_page("delta", 20)];

    let (a, b) = tokio::join!(
        state.ingest("doc.pdf", &pages),
        state.ingest("doc.pdf", &pages)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Exactly one of the two calls did the work
    assert!(a.chunks_added == 0 || b.chunks_added == 0);
    let added = a.chunks_added.max(b.chunks_added);
    assert!(added > 0);
    assert_eq!(state.index().len(), added);
    state.index().verify().unwrap();
}

#[tokio::test]
async fn reset_documents_clears_index_and_registry() {
    let state = state();
    state
        .ingest("doc.pdf", &["Some content worth indexing.".to_string()])
        .await
        .unwrap();
    state.reset_documents();

    assert_eq!(state.index().len(), 0);
    assert!(state.documents().is_empty());

    // The document can be ingested again from scratch
    let again = state
        .ingest("doc.pdf", &["Some content worth indexing.".to_string()])
        .await
        .unwrap();
    assert_eq!(again.chunks_added, 1);
}
