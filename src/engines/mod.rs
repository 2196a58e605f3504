//! Recognition engines and the factory that maps document categories to them.

pub mod handwritten;
pub mod pdf;
pub mod printed;

pub use handwritten::HandwrittenTextEngine;
pub use pdf::PdfTextEngine;
pub use printed::PrintedTextEngine;

use crate::backend::BackendProvider;
use crate::config::RecognitionTuning;
use crate::document::DocumentCategory;
use crate::engine::{EngineKind, EngineOutput, RecognitionEngine};
use crate::pdf::PdfExtractor;
use crate::preprocessing::ImagePreprocessor;
use crate::recognizer::{MultiStrategyRecognizer, RecognitionOutcome};
use serde::Serialize;
use std::sync::Arc;

/// Information about an available engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub kind: EngineKind,
    pub description: &'static str,
    pub categories: Vec<DocumentCategory>,
}

/// Holds one instance of each engine; `create` hands out shared references.
pub struct EngineFactory {
    printed: Arc<PrintedTextEngine>,
    handwritten: Arc<HandwrittenTextEngine>,
    pdf: Arc<PdfTextEngine>,
}

impl EngineFactory {
    pub fn new(
        preprocessor: Arc<ImagePreprocessor>,
        extractor: Arc<PdfExtractor>,
        provider: Arc<dyn BackendProvider>,
        tuning: RecognitionTuning,
    ) -> Self {
        let recognizer = Arc::new(MultiStrategyRecognizer::new(preprocessor, provider, tuning));
        Self {
            printed: Arc::new(PrintedTextEngine::new(recognizer.clone(), extractor.clone())),
            handwritten: Arc::new(HandwrittenTextEngine::new()),
            pdf: Arc::new(PdfTextEngine::new(recognizer, extractor)),
        }
    }

    /// Engine for `category`. Mixed and Unknown go to printed-text recognition.
    pub fn create(&self, category: DocumentCategory) -> Arc<dyn RecognitionEngine> {
        match category {
            DocumentCategory::Printed | DocumentCategory::Mixed | DocumentCategory::Unknown => {
                self.printed.clone()
            }
            DocumentCategory::Handwritten => self.handwritten.clone(),
            DocumentCategory::Pdf => self.pdf.clone(),
        }
    }

    pub fn engines(&self) -> Vec<Arc<dyn RecognitionEngine>> {
        vec![
            self.printed.clone() as Arc<dyn RecognitionEngine>,
            self.handwritten.clone(),
            self.pdf.clone(),
        ]
    }

    /// Get info about all available engines
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines()
            .iter()
            .map(|e| EngineInfo {
                kind: e.kind(),
                description: e.description(),
                categories: e.categories().to_vec(),
            })
            .collect()
    }
}

impl From<RecognitionOutcome> for EngineOutput {
    fn from(outcome: RecognitionOutcome) -> Self {
        let source = outcome.source_approach();
        EngineOutput::new(outcome.text, outcome.confidence, source)
    }
}

/// Run blocking recognition on the blocking pool. A panicking worker yields
/// an empty result.
async fn run_blocking<F>(kind: EngineKind, work: F) -> EngineOutput
where
    F: FnOnce() -> EngineOutput + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("{} worker failed: {}", kind, e);
            EngineOutput::empty("none")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOutput, RecognitionBackend, RecognitionParams};
    use crate::error::OcrError;
    use image::DynamicImage;

    struct Silent;

    impl RecognitionBackend for Silent {
        fn recognize(
            &self,
            _image: &DynamicImage,
            _params: &RecognitionParams<'_>,
        ) -> Result<BackendOutput, OcrError> {
            Ok(BackendOutput {
                text: String::new(),
                confidence_percent: 0.0,
            })
        }
    }

    struct SilentProvider;

    impl BackendProvider for SilentProvider {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn description(&self) -> &'static str {
            "returns nothing"
        }

        fn create(&self) -> Result<Box<dyn RecognitionBackend>, OcrError> {
            Ok(Box::new(Silent))
        }
    }

    fn factory() -> EngineFactory {
        EngineFactory::new(
            Arc::new(ImagePreprocessor::default()),
            Arc::new(PdfExtractor::default()),
            Arc::new(SilentProvider),
            RecognitionTuning::default(),
        )
    }

    #[test]
    fn test_category_mapping() {
        let factory = factory();
        let expected = [
            (DocumentCategory::Printed, EngineKind::PrintedText),
            (DocumentCategory::Handwritten, EngineKind::HandwrittenText),
            (DocumentCategory::Pdf, EngineKind::PdfText),
            (DocumentCategory::Mixed, EngineKind::PrintedText),
            (DocumentCategory::Unknown, EngineKind::PrintedText),
        ];
        for (category, kind) in expected {
            assert_eq!(factory.create(category).kind(), kind, "{}", category);
        }
    }

    #[test]
    fn test_every_category_is_claimed_by_its_engine() {
        let factory = factory();
        for category in DocumentCategory::ALL {
            assert!(factory.create(category).categories().contains(&category));
        }
        assert_eq!(factory.info().len(), 3);
    }

    #[tokio::test]
    async fn test_garbage_yields_empty_output() {
        let factory = factory();
        let buffer = crate::document::DocumentBuffer::from_bytes(b"garbage".to_vec());

        let out = factory.create(DocumentCategory::Printed).process(&buffer).await;
        assert_eq!(out.text, "");
        assert_eq!(out.confidence, 0.0);

        let out = factory.create(DocumentCategory::Pdf).process(&buffer).await;
        assert_eq!(out.text, "");
        assert_eq!(out.confidence, 0.0);
    }
}
