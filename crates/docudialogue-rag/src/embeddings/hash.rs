//! Deterministic hashing embedder

use async_trait::async_trait;

use crate::error::Result;

use super::EmbeddingProvider;

/// Bag-of-words hashing embedder.
///
/// Buckets lowercased word tokens into a fixed-length vector with FNV-1a and
/// L2-normalizes the counts. Identical texts always embed identically and
/// cosine(t, t) = 1, which makes this provider suitable for offline runs and
/// deterministic tests; it has no notion of semantics beyond shared words.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % self.dimensions;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["Revenue was $5M in 2023.".to_string()];
        let a = embedder.embed(&texts).await.unwrap();
        let b = embedder.embed(&texts).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let embedder = HashEmbedder::new(64);
        let vectors = embedder
            .embed(&["some document text here".to_string()])
            .await
            .unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn self_similarity_beats_unrelated_text() {
        let embedder = HashEmbedder::new(128);
        let vectors = embedder
            .embed(&[
                "quarterly revenue figures for the fiscal year".to_string(),
                "completely different topic about gardening tools".to_string(),
            ])
            .await
            .unwrap();
        let self_sim = cosine(&vectors[0], &vectors[0]);
        let cross_sim = cosine(&vectors[0], &vectors[1]);
        assert!((self_sim - 1.0).abs() < 1e-5);
        assert!(cross_sim < self_sim);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(32);
        let vectors = embedder.embed(&["   ".to_string()]).await.unwrap();
        assert!(vectors[0].iter().all(|v| *v == 0.0));
    }
}
