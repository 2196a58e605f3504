use crate::document::{DocumentBuffer, DocumentCategory, DocumentFormat};

/// Decides which category a document belongs to. Must be deterministic for
/// a given buffer.
pub trait DocumentClassifier: Send + Sync {
    fn classify(&self, buffer: &DocumentBuffer) -> DocumentCategory;
}

/// Format-based classification: PDFs are `Pdf`, anything that looks like a
/// raster image is `Printed`, the rest is `Unknown`.
///
/// Handwritten and mixed documents cannot be told apart from bytes alone;
/// callers pass those categories explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl DocumentClassifier for HeuristicClassifier {
    fn classify(&self, buffer: &DocumentBuffer) -> DocumentCategory {
        let category = match buffer.format() {
            DocumentFormat::Pdf => DocumentCategory::Pdf,
            DocumentFormat::Image(_) => DocumentCategory::Printed,
            DocumentFormat::Unknown => match buffer.declared_mime() {
                Some(mime) if mime.starts_with("image/") => DocumentCategory::Printed,
                _ => DocumentCategory::Unknown,
            },
        };
        tracing::debug!(
            "Classified {} byte document as {}",
            buffer.len(),
            category
        );
        category
    }
}
