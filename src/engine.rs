use crate::document::{clamp_confidence, DocumentBuffer, DocumentCategory};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Result of one engine invocation
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// 0-1
    pub confidence: f32,
    /// Which approach produced the text
    pub source_approach: String,
}

impl EngineOutput {
    pub fn new(text: String, confidence: f32, source_approach: impl Into<String>) -> Self {
        Self {
            text,
            confidence: clamp_confidence(confidence),
            source_approach: source_approach.into(),
        }
    }

    /// Nothing recognized
    pub fn empty(source_approach: impl Into<String>) -> Self {
        Self::new(String::new(), 0.0, source_approach)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    PrintedText,
    HandwrittenText,
    PdfText,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::PrintedText => "printed_text",
            EngineKind::HandwrittenText => "handwritten_text",
            EngineKind::PdfText => "pdf_text",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that all recognition engines must implement.
///
/// Engines never fail: an unreadable document yields empty text with zero
/// confidence and the cause is logged.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Categories this engine is selected for
    fn categories(&self) -> &'static [DocumentCategory];

    /// Recognize `buffer` once, returning text and confidence together
    async fn process(&self, buffer: &DocumentBuffer) -> EngineOutput;

    async fn recognize(&self, buffer: &DocumentBuffer) -> String {
        self.process(buffer).await.text
    }

    async fn confidence(&self, buffer: &DocumentBuffer) -> f32 {
        self.process(buffer).await.confidence
    }
}
