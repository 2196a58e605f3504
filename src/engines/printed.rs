use super::{pdf, run_blocking};
use crate::document::{DocumentBuffer, DocumentCategory};
use crate::engine::{EngineKind, EngineOutput, RecognitionEngine};
use crate::pdf::PdfExtractor;
use crate::recognizer::MultiStrategyRecognizer;
use async_trait::async_trait;
use std::sync::Arc;

/// Multi-strategy OCR for printed documents. PDFs are routed to the PDF path.
pub struct PrintedTextEngine {
    recognizer: Arc<MultiStrategyRecognizer>,
    extractor: Arc<PdfExtractor>,
}

impl PrintedTextEngine {
    pub fn new(recognizer: Arc<MultiStrategyRecognizer>, extractor: Arc<PdfExtractor>) -> Self {
        Self {
            recognizer,
            extractor,
        }
    }
}

#[async_trait]
impl RecognitionEngine for PrintedTextEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PrintedText
    }

    fn description(&self) -> &'static str {
        "Adaptive multi-strategy OCR for printed text"
    }

    fn categories(&self) -> &'static [DocumentCategory] {
        &[
            DocumentCategory::Printed,
            DocumentCategory::Mixed,
            DocumentCategory::Unknown,
        ]
    }

    async fn process(&self, buffer: &DocumentBuffer) -> EngineOutput {
        let bytes = buffer.shared_bytes();
        let recognizer = self.recognizer.clone();

        if self.extractor.is_pdf_format(&bytes) {
            tracing::debug!("Printed engine received a PDF, using PDF extraction");
            let extractor = self.extractor.clone();
            return run_blocking(self.kind(), move || {
                pdf::recognize_pdf(&extractor, &recognizer, &bytes)
            })
            .await;
        }

        run_blocking(self.kind(), move || recognizer.recognize_bytes(&bytes).into()).await
    }
}
