use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;

/// Layout assumption passed to the backend for one recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Find as much text as possible in no particular order
    SparseText,
    /// Assume a single uniform block of text
    UniformBlock,
    /// Fully automatic page segmentation
    Automatic,
}

impl SegmentationMode {
    /// Tesseract page segmentation mode number
    pub fn psm(&self) -> u8 {
        match self {
            SegmentationMode::SparseText => 11,
            SegmentationMode::UniformBlock => 6,
            SegmentationMode::Automatic => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentationMode::SparseText => "sparse",
            SegmentationMode::UniformBlock => "block",
            SegmentationMode::Automatic => "auto",
        }
    }
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a single backend run
#[derive(Debug, Clone, Copy)]
pub struct RecognitionParams<'a> {
    pub segmentation: SegmentationMode,
    pub char_whitelist: &'a str,
}

/// Raw backend output before post-processing
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutput {
    pub text: String,
    /// Backend-reported confidence on a 0-100 scale
    pub confidence_percent: f32,
}

/// A loaded OCR backend instance. Instances are created per worker and
/// dropped when the worker finishes, so they are never shared across calls.
pub trait RecognitionBackend: Send {
    fn recognize(
        &self,
        image: &DynamicImage,
        params: &RecognitionParams<'_>,
    ) -> Result<BackendOutput, OcrError>;
}

/// Creates backend instances on demand.
///
/// Holds only what is needed to build a backend (model paths, language data
/// location), never a loaded backend.
pub trait BackendProvider: Send + Sync {
    /// Returns the backend identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the backend
    fn description(&self) -> &'static str;

    fn create(&self) -> Result<Box<dyn RecognitionBackend>, OcrError>;
}

/// Keep only whitelisted characters (plus line breaks) in backend output.
///
/// Used by backends that cannot restrict their alphabet natively.
pub fn apply_whitelist(text: &str, whitelist: &str) -> String {
    if whitelist.is_empty() {
        return text.to_string();
    }
    text.chars()
        .filter(|c| *c == '\n' || whitelist.contains(*c))
        .collect()
}
