//! Composition root: classify, pick an engine, recognize, store.

use crate::backends;
use crate::backend::BackendProvider;
use crate::classifier::{DocumentClassifier, HeuristicClassifier};
use crate::config::{Config, Tuning};
use crate::document::{DocumentBuffer, DocumentCategory, OcrRecognitionResult};
use crate::engines::EngineFactory;
use crate::error::OcrError;
use crate::pdf::PdfExtractor;
use crate::preprocessing::ImagePreprocessor;
use crate::store::{InMemoryResultStore, MessageKey, OcrResultStore};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

pub struct DocumentProcessingService {
    classifier: Arc<dyn DocumentClassifier>,
    factory: Arc<EngineFactory>,
    store: Arc<dyn OcrResultStore>,
}

impl DocumentProcessingService {
    pub fn new(
        classifier: Arc<dyn DocumentClassifier>,
        factory: Arc<EngineFactory>,
        store: Arc<dyn OcrResultStore>,
    ) -> Self {
        Self {
            classifier,
            factory,
            store,
        }
    }

    /// Heuristic classifier and shared preprocessor/extractor around the
    /// given backend provider.
    pub fn with_provider(
        provider: Arc<dyn BackendProvider>,
        tuning: &Tuning,
        store: Arc<dyn OcrResultStore>,
    ) -> Self {
        let factory = EngineFactory::new(
            Arc::new(ImagePreprocessor::new(tuning.preprocessing.clone())),
            Arc::new(PdfExtractor::new(&tuning.pdf)),
            provider,
            tuning.recognition.clone(),
        );
        Self::new(Arc::new(HeuristicClassifier), Arc::new(factory), store)
    }

    /// Wire up the configured backend with an in-memory store.
    pub fn from_config(config: &Config) -> Result<Self, OcrError> {
        let provider = backends::create_provider(config)?;
        Ok(Self::with_provider(
            provider,
            &config.tuning,
            Arc::new(InMemoryResultStore::new()),
        ))
    }

    pub fn factory(&self) -> &EngineFactory {
        &self.factory
    }

    /// Recognize one document and store the result under `key`.
    ///
    /// Recognition itself never fails; only a store failure is returned.
    pub async fn process(
        &self,
        buffer: &DocumentBuffer,
        key: &MessageKey,
        category: Option<DocumentCategory>,
    ) -> Result<OcrRecognitionResult, OcrError> {
        let start = Instant::now();
        let category = match category {
            Some(category) => category,
            None => self.classifier.classify(buffer),
        };

        let engine = self.factory.create(category);
        tracing::info!(
            "Processing {} byte {} document with {}",
            buffer.len(),
            category,
            engine.kind()
        );

        let output = engine.process(buffer).await;
        let result = OcrRecognitionResult::new(
            output.text,
            output.confidence,
            output.source_approach,
            category,
        );

        self.store.save(&result, key).await?;

        tracing::info!(
            "Processed document in {}ms: {} chars, confidence {:.2}, via {}",
            start.elapsed().as_millis(),
            result.recognized_text.chars().count(),
            result.confidence,
            result.source_approach
        );
        Ok(result)
    }

    /// Process several documents attached to the same message concurrently.
    /// Results come back in input order.
    pub async fn process_many(
        &self,
        buffers: &[DocumentBuffer],
        key: &MessageKey,
        category: Option<DocumentCategory>,
    ) -> Vec<Result<OcrRecognitionResult, OcrError>> {
        join_all(
            buffers
                .iter()
                .map(|buffer| self.process(buffer, key, category)),
        )
        .await
    }

    pub async fn context_for(&self, session_id: &str) -> Result<String, OcrError> {
        self.store.context_for(session_id).await
    }
}
