use super::run_blocking;
use crate::document::{DocumentBuffer, DocumentCategory};
use crate::engine::{EngineKind, EngineOutput, RecognitionEngine};
use crate::pdf::{PageContent, PdfExtractor};
use crate::recognizer::MultiStrategyRecognizer;
use async_trait::async_trait;
use std::sync::Arc;

/// Text-layer extraction with per-page OCR for scanned pages.
/// Non-PDF input falls through to image recognition.
pub struct PdfTextEngine {
    recognizer: Arc<MultiStrategyRecognizer>,
    extractor: Arc<PdfExtractor>,
}

impl PdfTextEngine {
    pub fn new(recognizer: Arc<MultiStrategyRecognizer>, extractor: Arc<PdfExtractor>) -> Self {
        Self {
            recognizer,
            extractor,
        }
    }
}

#[async_trait]
impl RecognitionEngine for PdfTextEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PdfText
    }

    fn description(&self) -> &'static str {
        "PDF text layer extraction with OCR for scanned pages"
    }

    fn categories(&self) -> &'static [DocumentCategory] {
        &[DocumentCategory::Pdf]
    }

    async fn process(&self, buffer: &DocumentBuffer) -> EngineOutput {
        let bytes = buffer.shared_bytes();
        let recognizer = self.recognizer.clone();

        if !self.extractor.is_pdf_format(&bytes) {
            tracing::debug!("PDF engine received a non-PDF buffer, recognizing as image");
            return run_blocking(self.kind(), move || recognizer.recognize_bytes(&bytes).into())
                .await;
        }

        let extractor = self.extractor.clone();
        run_blocking(self.kind(), move || {
            recognize_pdf(&extractor, &recognizer, &bytes)
        })
        .await
    }
}

/// Blocking. Extract text layers, OCR rasterized pages in a single worker,
/// and join everything in page order.
pub(crate) fn recognize_pdf(
    extractor: &PdfExtractor,
    recognizer: &MultiStrategyRecognizer,
    bytes: &[u8],
) -> EngineOutput {
    let extraction = match extractor.extract(bytes) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::warn!("PDF extraction failed: {}", e);
            return EngineOutput::empty("pdf_unreadable");
        }
    };

    let mut worker = recognizer.worker();
    let mut parts = Vec::with_capacity(extraction.page_count());
    let mut ocr_confidences = Vec::new();

    for page in extraction.pages.iter() {
        match &page.content {
            PageContent::Text(text) => parts.push(text.clone()),
            PageContent::Raster(image) => {
                tracing::info!("OCR for scanned page {}", page.number);
                let outcome = recognizer.recognize_with(&mut worker, Ok(image.clone()));
                ocr_confidences.push(outcome.confidence);
                if !outcome.text.is_empty() {
                    parts.push(outcome.text);
                }
            }
            PageContent::Failed(_) => parts.extend(page.placeholder()),
            PageContent::Empty => {}
        }
    }

    let has_text_layer = extraction.has_text_layer();
    let confidence = if has_text_layer {
        1.0
    } else if ocr_confidences.is_empty() {
        0.0
    } else {
        ocr_confidences.iter().sum::<f32>() / ocr_confidences.len() as f32
    };

    let source = match (has_text_layer, ocr_confidences.is_empty()) {
        (true, true) => "pdf_text_layer",
        (true, false) => "pdf_text_layer+ocr",
        (false, false) => "pdf_page_ocr",
        (false, true) => "pdf_empty",
    };

    let text = parts.join("\n\n");
    tracing::info!(
        "PDF produced {} chars from {} pages ({} OCR)",
        text.chars().count(),
        extraction.page_count(),
        ocr_confidences.len()
    );

    EngineOutput::new(text, confidence, source)
}
