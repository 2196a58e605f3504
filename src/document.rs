//! Documents flowing through recognition and the result that gets stored.

use chrono::{DateTime, Utc};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Container format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Image(ImageFormat),
    Unknown,
}

impl DocumentFormat {
    /// Sniff the format from magic bytes, falling back to the declared MIME type.
    pub fn detect(bytes: &[u8], declared_mime: Option<&str>) -> Self {
        if bytes.starts_with(PDF_MAGIC) {
            return DocumentFormat::Pdf;
        }
        if let Ok(format) = image::guess_format(bytes) {
            return DocumentFormat::Image(format);
        }

        match declared_mime {
            Some("application/pdf") => DocumentFormat::Pdf,
            Some(mime) => ImageFormat::from_mime_type(mime)
                .map(DocumentFormat::Image)
                .unwrap_or(DocumentFormat::Unknown),
            None => DocumentFormat::Unknown,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, DocumentFormat::Pdf)
    }
}

/// Immutable uploaded document. Cloning shares the underlying bytes.
#[derive(Debug, Clone)]
pub struct DocumentBuffer {
    bytes: Arc<[u8]>,
    format: DocumentFormat,
    declared_mime: Option<String>,
}

impl DocumentBuffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>, declared_mime: Option<String>) -> Self {
        let bytes = bytes.into();
        let format = DocumentFormat::detect(&bytes, declared_mime.as_deref());
        Self {
            bytes,
            format,
            declared_mime,
        }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(bytes, None)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Category a document is classified into; drives engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Printed,
    Handwritten,
    Pdf,
    Mixed,
    Unknown,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 5] = [
        DocumentCategory::Printed,
        DocumentCategory::Handwritten,
        DocumentCategory::Pdf,
        DocumentCategory::Mixed,
        DocumentCategory::Unknown,
    ];

    /// Parse a category label. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "printed" => DocumentCategory::Printed,
            "handwritten" => DocumentCategory::Handwritten,
            "pdf" => DocumentCategory::Pdf,
            "mixed" => DocumentCategory::Mixed,
            _ => DocumentCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Printed => "printed",
            DocumentCategory::Handwritten => "handwritten",
            DocumentCategory::Pdf => "pdf",
            DocumentCategory::Mixed => "mixed",
            DocumentCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stored outcome of recognizing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRecognitionResult {
    pub recognized_text: String,
    /// Always within [0, 1].
    pub confidence: f32,
    pub source_approach: String,
    pub document_category: DocumentCategory,
    pub timestamp: DateTime<Utc>,
}

impl OcrRecognitionResult {
    pub fn new(
        recognized_text: String,
        confidence: f32,
        source_approach: impl Into<String>,
        document_category: DocumentCategory,
    ) -> Self {
        Self {
            recognized_text,
            confidence: clamp_confidence(confidence),
            source_approach: source_approach.into(),
            document_category,
            timestamp: Utc::now(),
        }
    }
}

/// Clamp a confidence into [0, 1], mapping NaN to 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
