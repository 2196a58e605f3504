use crate::document::{DocumentBuffer, DocumentCategory};
use crate::engine::{EngineKind, EngineOutput, RecognitionEngine};
use async_trait::async_trait;

pub const HANDWRITING_PLACEHOLDER: &str =
    "[Handwritten document received. Handwriting recognition is not available yet.]";

const MIN_CONFIDENCE: f32 = 0.30;
/// Width of the confidence band above the minimum, in hundredths
const CONFIDENCE_STEPS: usize = 21;

/// Stand-in for handwriting recognition.
///
/// Returns fixed text with a low confidence derived from the buffer so the
/// same document always reports the same value.
#[derive(Debug, Default)]
pub struct HandwrittenTextEngine;

impl HandwrittenTextEngine {
    pub fn new() -> Self {
        Self
    }

    fn confidence_for(len: usize) -> f32 {
        MIN_CONFIDENCE + (len % CONFIDENCE_STEPS) as f32 / 100.0
    }
}

#[async_trait]
impl RecognitionEngine for HandwrittenTextEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::HandwrittenText
    }

    fn description(&self) -> &'static str {
        "Placeholder for handwriting recognition"
    }

    fn categories(&self) -> &'static [DocumentCategory] {
        &[DocumentCategory::Handwritten]
    }

    async fn process(&self, buffer: &DocumentBuffer) -> EngineOutput {
        tracing::info!(
            "Handwriting recognition not available, returning placeholder for {} bytes",
            buffer.len()
        );
        EngineOutput::new(
            HANDWRITING_PLACEHOLDER.to_string(),
            Self::confidence_for(buffer.len()),
            "handwriting_placeholder",
        )
    }
}
