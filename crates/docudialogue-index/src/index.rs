//! Exact nearest-neighbor store over cosine similarity

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Provenance attached to every indexed chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the document the chunk came from
    pub source: String,
    /// Zero-based page index within the document
    pub page: usize,
}

/// An entry submitted for indexing
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Unique chunk id (overwrites any existing entry with the same id)
    pub chunk_id: String,
    /// Embedding vector; length must match the index dimensionality
    pub vector: Vec<f32>,
    /// Raw chunk text
    pub text: String,
    /// Source attribution
    pub metadata: ChunkMetadata,
}

/// A scored query result
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Chunk id of the matched entry
    pub chunk_id: String,
    /// Raw chunk text
    pub text: String,
    /// Source attribution
    pub metadata: ChunkMetadata,
    /// Cosine similarity to the query vector, in [-1, 1]
    pub score: f32,
}

struct StoredEntry {
    vector: Vec<f32>,
    norm: f32,
    text: String,
    metadata: ChunkMetadata,
}

struct Shard {
    entries: HashMap<String, StoredEntry>,
    /// chunk ids per source document, kept for O(1) document removal
    by_document: HashMap<String, HashSet<String>>,
}

/// In-memory vector index.
///
/// Similarity is cosine: `dot(a, b) / (|a| * |b|)`, higher is more similar.
/// Queries return results in descending similarity order; equal scores are
/// broken by ascending chunk id so result order is deterministic. All writes
/// take the single write lock; reads share the read lock, so ingestion never
/// blocks concurrent retrieval by other readers.
pub struct VectorIndex {
    dimensions: usize,
    shard: RwLock<Shard>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(IndexError::InvalidDimensions(dimensions));
        }
        Ok(Self {
            dimensions,
            shard: RwLock::new(Shard {
                entries: HashMap::new(),
                by_document: HashMap::new(),
            }),
        })
    }

    /// Dimensionality every stored and queried vector must have.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert entries, overwriting any entry that shares a chunk id.
    ///
    /// The batch is validated before anything is written: if any vector has
    /// the wrong length the whole call fails and the index is unchanged.
    pub fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        for entry in &entries {
            if entry.vector.len() != self.dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimensions,
                    got: entry.vector.len(),
                });
            }
        }

        let count = entries.len();
        let mut shard = self.shard.write();
        for entry in entries {
            let norm = l2_norm(&entry.vector);
            if let Some(previous) = shard.entries.insert(
                entry.chunk_id.clone(),
                StoredEntry {
                    vector: entry.vector,
                    norm,
                    text: entry.text,
                    metadata: entry.metadata.clone(),
                },
            ) {
                // Same id may move between documents on overwrite
                if previous.metadata.source != entry.metadata.source {
                    let emptied = match shard.by_document.get_mut(&previous.metadata.source) {
                        Some(ids) => {
                            ids.remove(&entry.chunk_id);
                            ids.is_empty()
                        }
                        None => false,
                    };
                    if emptied {
                        shard.by_document.remove(&previous.metadata.source);
                    }
                }
            }
            shard
                .by_document
                .entry(entry.metadata.source)
                .or_default()
                .insert(entry.chunk_id);
        }
        tracing::debug!(count, total = shard.entries.len(), "upserted entries");
        Ok(())
    }

    /// Nearest-neighbor query.
    ///
    /// Returns `min(k, len)` hits ordered by descending similarity, ties by
    /// ascending chunk id. An empty index yields an empty Vec.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if vector.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(vector);
        let shard = self.shard.read();
        let mut hits: Vec<SearchHit> = shard
            .entries
            .par_iter()
            .map(|(chunk_id, entry)| SearchHit {
                chunk_id: chunk_id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                score: cosine(vector, query_norm, &entry.vector, entry.norm),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Delete every entry whose metadata source matches `document`.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&self, document: &str) -> usize {
        let mut shard = self.shard.write();
        let Some(ids) = shard.by_document.remove(document) else {
            return 0;
        };
        for id in &ids {
            shard.entries.remove(id);
        }
        tracing::debug!(document, removed = ids.len(), "removed document entries");
        ids.len()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.shard.read().entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut shard = self.shard.write();
        shard.entries.clear();
        shard.by_document.clear();
    }

    /// Cross-check internal invariants.
    ///
    /// Fatal when it fails: entry dimensionality or the document bookkeeping
    /// no longer matches the entry map, and no automatic repair is attempted.
    pub fn verify(&self) -> Result<()> {
        let shard = self.shard.read();
        for (id, entry) in &shard.entries {
            if entry.vector.len() != self.dimensions {
                return Err(IndexError::Corruption(format!(
                    "entry '{id}' has dimensionality {} (index expects {})",
                    entry.vector.len(),
                    self.dimensions
                )));
            }
        }
        let tracked: usize = shard.by_document.values().map(HashSet::len).sum();
        if tracked != shard.entries.len() {
            return Err(IndexError::Corruption(format!(
                "document map tracks {tracked} ids but {} entries are stored",
                shard.entries.len()
            )));
        }
        for (document, ids) in &shard.by_document {
            for id in ids {
                match shard.entries.get(id) {
                    Some(entry) if entry.metadata.source == *document => {}
                    _ => {
                        return Err(IndexError::Corruption(format!(
                            "document map references unknown or relocated chunk '{id}'"
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm < f32::EPSILON || b_norm < f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}
