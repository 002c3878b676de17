//! Page-aware text chunking with overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Splits page text into overlapping fixed-size passages.
///
/// Chunk boundaries prefer paragraph breaks, then sentence boundaries, and
/// fall back to hard cuts at the nearest character boundary. Splitting is a
/// pure function of the input: the same pages always produce the same chunk
/// boundaries and ordering.
pub struct PageChunker {
    chunk_size: usize,
    overlap: usize,
}

impl PageChunker {
    /// Create a chunker from configuration. Overlap is capped below the
    /// chunk size so every step makes forward progress.
    pub fn new(config: &ChunkingConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            chunk_size,
            overlap: config.chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Split a document's pages into chunks.
    ///
    /// Each chunk keeps its originating page index; the sequence index runs
    /// across the whole document so derived chunk ids stay unique. Empty or
    /// whitespace-only pages contribute nothing.
    pub fn split(&self, document: &str, pages: &[String]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut seq = 0;
        for (page, text) in pages.iter().enumerate() {
            for piece in self.split_page(text) {
                chunks.push(Chunk::new(document, page, seq, piece));
                seq += 1;
            }
        }
        chunks
    }

    fn split_page(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let end = if start + self.chunk_size >= text.len() {
                text.len()
            } else {
                let mut hard_end = start + self.chunk_size;
                while !text.is_char_boundary(hard_end) {
                    hard_end -= 1;
                }
                let cut = self.find_break(&text[start..hard_end]);
                start + if cut == 0 { hard_end - start } else { cut }
            };

            let piece = text[start..end].trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            if end >= text.len() {
                break;
            }

            let mut next = end.saturating_sub(self.overlap);
            if next <= start {
                next = end;
            }
            while !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }
        pieces
    }

    /// Pick a cut point inside `window`, preferring a paragraph break, then
    /// the last full sentence. Boundaries in the first half of the window are
    /// ignored so chunks do not degenerate.
    fn find_break(&self, window: &str) -> usize {
        if let Some(pos) = window.rfind("\n\n") {
            if pos >= self.chunk_size / 2 {
                return pos;
            }
        }

        let mut consumed = 0;
        for sentence in window.split_sentence_bounds() {
            if consumed + sentence.len() >= window.len() {
                break;
            }
            consumed += sentence.len();
        }
        if consumed >= self.chunk_size / 2 {
            return consumed;
        }

        window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, chunk_overlap: usize) -> PageChunker {
        PageChunker::new(&ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {i} talks about the quarterly report. "))
            .collect()
    }

    #[test]
    fn short_page_yields_a_single_chunk() {
        let chunks = chunker(1500, 300).split("doc.pdf", &["Revenue was $5M in 2023.".to_string()]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Revenue was $5M in 2023.");
        assert_eq!(chunks[0].id, "doc.pdf-0");
        assert_eq!(chunks[0].page, 0);
    }

    #[test]
    fn splitting_is_deterministic() {
        let pages = vec![long_text(80), long_text(40)];
        let a = chunker(200, 40).split("doc", &pages);
        let b = chunker(200, 40).split("doc", &pages);
        assert_eq!(a, b);
    }

    #[test]
    fn chunks_never_exceed_the_target_size() {
        let chunks = chunker(200, 40).split("doc", &[long_text(100)]);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.len() <= 200));
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let chunks = chunker(200, 60).split("doc", &[long_text(100)]);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().rev().take(20).collect();
            let tail: String = tail.chars().rev().collect();
            assert!(
                pair[1].text.contains(tail.trim()) || pair[1].seq != pair[0].seq + 1,
                "chunk {} shares no tail with its successor",
                pair[0].seq
            );
        }
    }

    #[test]
    fn empty_and_whitespace_pages_yield_no_chunks() {
        let pages = vec![String::new(), "   \n\t ".to_string(), "real text".to_string()];
        let chunks = chunker(1500, 300).split("doc", &pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, 2);
        assert_eq!(chunks[0].seq, 0);
    }

    #[test]
    fn sequence_runs_across_pages_and_ids_are_unique() {
        let pages = vec![long_text(50), long_text(50)];
        let chunks = chunker(200, 40).split("doc", &pages);
        let mut ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.seq, i);
        }
        assert!(chunks.iter().any(|c| c.page == 1));
    }

    #[test]
    fn paragraph_breaks_are_preferred_cut_points() {
        let first = "First paragraph with enough text to matter for the test.";
        let second = "Second paragraph that continues the document body onward.";
        let page = format!("{first}\n\n{second}");
        let chunks = chunker(80, 10).split("doc", &[page]);
        assert_eq!(chunks[0].text, first);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let page = "é".repeat(500);
        let chunks = chunker(120, 30).split("doc", &[page]);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().all(|c| c == 'é'));
        }
    }
}
