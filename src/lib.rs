//! Adaptive multi-strategy document recognition.
//!
//! A [`service::DocumentProcessingService`] classifies an uploaded document,
//! picks a recognition engine for its category, and stores the recognized
//! text so it can be served back as conversational context. Printed images
//! go through [`recognizer::MultiStrategyRecognizer`], which tries several
//! preprocessing/segmentation approaches and keeps the best-scoring text.

pub mod backend;
pub mod backends;
pub mod classifier;
pub mod config;
pub mod document;
pub mod engine;
pub mod engines;
pub mod error;
pub mod pdf;
pub mod preprocessing;
pub mod recognizer;
pub mod server;
pub mod service;
pub mod store;

pub use document::{DocumentBuffer, DocumentCategory, OcrRecognitionResult};
pub use engine::{EngineOutput, RecognitionEngine};
pub use error::OcrError;
pub use service::DocumentProcessingService;
