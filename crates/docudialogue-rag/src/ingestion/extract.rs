//! Page-text extraction from document files

use std::path::Path;

use crate::error::Result;

/// Capability for turning a file into an ordered sequence of page texts.
///
/// The RAG core treats extraction as a black box: any failure surfaces as
/// [`Error::DocumentUnreadable`](crate::Error::DocumentUnreadable) and aborts
/// ingestion for that document only.
pub trait PageExtractor: Send + Sync {
    /// Extract page texts, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF page extractor backed by `lopdf`.
#[cfg(feature = "pdf")]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        use crate::error::Error;

        let name = path.display().to_string();
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::unreadable(&name, e.to_string()))?;

        let mut pages = Vec::new();
        for (page_number, _) in doc.get_pages() {
            let text = doc
                .extract_text(&[page_number])
                .map_err(|e| Error::unreadable(&name, format!("page {page_number}: {e}")))?;
            pages.push(cleanup_page_text(&text));
        }

        if pages.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::unreadable(
                &name,
                "no text content could be extracted",
            ));
        }

        tracing::debug!(document = %name, pages = pages.len(), "extracted PDF pages");
        Ok(pages)
    }
}

/// Strip null characters and collapse blank lines left behind by extraction.
#[cfg(feature = "pdf")]
fn cleanup_page_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(all(test, feature = "pdf"))]
mod tests {
    use super::*;

    #[test]
    fn cleanup_strips_nulls_and_blank_lines() {
        let raw = "First line\0\n\n   \nSecond line  \n";
        assert_eq!(cleanup_page_text(raw), "First line\nSecond line");
    }

    #[test]
    fn missing_file_is_reported_as_unreadable() {
        let err = PdfExtractor
            .extract_pages(Path::new("/nonexistent/file.pdf"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::DocumentUnreadable { .. }));
    }
}
