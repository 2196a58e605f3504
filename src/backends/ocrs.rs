//! OCRS backend implementation
//!
//! Pure Rust OCR using the ocrs library. No system dependencies required.
//! Neural network models are downloaded into the cache dir on first use and
//! loaded afresh by every worker that needs a backend instance.

use super::download::{cache_dir, ensure_cached};
use crate::backend::{
    apply_whitelist, BackendOutput, BackendProvider, RecognitionBackend, RecognitionParams,
    SegmentationMode,
};
use crate::config::Config;
use crate::error::OcrError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::path::PathBuf;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// Knows where the ocrs models live; builds engines on demand.
pub struct OcrsProvider {
    detection_model_path: PathBuf,
    recognition_model_path: PathBuf,
}

impl OcrsProvider {
    /// Ensure the models are cached locally, downloading them if needed
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        let dir = cache_dir();
        let detection_model_path =
            ensure_cached(DETECTION_MODEL_URL, &dir, "text-detection.rten")?;
        let recognition_model_path =
            ensure_cached(RECOGNITION_MODEL_URL, &dir, "text-recognition.rten")?;

        tracing::info!("ocrs backend ready (models in {:?})", dir);

        Ok(Self {
            detection_model_path,
            recognition_model_path,
        })
    }
}

impl BackendProvider for OcrsProvider {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn create(&self) -> Result<Box<dyn RecognitionBackend>, OcrError> {
        let detection_model = Model::load_file(&self.detection_model_path).map_err(|e| {
            OcrError::Initialization(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&self.recognition_model_path).map_err(|e| {
            OcrError::Initialization(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| OcrError::Initialization(format!("Failed to create OCR engine: {}", e)))?;

        Ok(Box::new(OcrsBackend { engine }))
    }
}

/// A loaded ocrs engine, owned by a single worker
pub struct OcrsBackend {
    engine: OcrsOcrEngine,
}

impl RecognitionBackend for OcrsBackend {
    fn recognize(
        &self,
        image: &DynamicImage,
        params: &RecognitionParams<'_>,
    ) -> Result<BackendOutput, OcrError> {
        // ImageSource::from_bytes expects RGB8 in HWC layout
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::EngineExecution(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::EngineExecution(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::EngineExecution(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::EngineExecution(format!("Failed to recognize text: {}", e)))?;

        // ocrs does its own layout analysis; the segmentation mode only
        // decides whether detected lines are kept apart.
        let line_separator = match params.segmentation {
            SegmentationMode::SparseText => " ",
            SegmentationMode::UniformBlock | SegmentationMode::Automatic => "\n",
        };

        let text = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(line_separator);

        let text = apply_whitelist(&text, params.char_whitelist);
        let confidence_percent = estimate_confidence(&text) * 100.0;

        tracing::debug!(
            "ocrs recognized {} chars ({} lines), estimated confidence {:.1}%",
            text.len(),
            line_rects.len(),
            confidence_percent
        );

        Ok(BackendOutput {
            text,
            confidence_percent,
        })
    }
}

// ============================================================================
// Confidence estimation
// ============================================================================

/// Estimate confidence (0.0-1.0) from text quality heuristics.
///
/// ocrs reports no per-character scores, so the recognized text itself is
/// inspected for patterns typical of garbled output.
pub fn estimate_confidence(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if text.chars().count() < 5 {
        return 0.5;
    }

    let confidence = 0.40 * char_mix_score(text)
        + 0.30 * word_length_score(text)
        + 0.15 * whitespace_score(text)
        + 0.15 * repetition_score(text);

    confidence.clamp(0.0, 1.0)
}

/// Penalizes exotic symbols and a low share of letters.
fn char_mix_score(text: &str) -> f32 {
    let total = text.chars().count() as f32;
    let letters = text.chars().filter(|c| c.is_alphabetic()).count() as f32;
    let exotic = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count() as f32;

    let exotic_penalty = 1.0 - (exotic / total * 10.0).min(1.0);
    let letter_score = (letters / total * 1.5).min(1.0);

    exotic_penalty * 0.6 + letter_score * 0.4
}

/// Garbled output tends toward one-character "words" or endless runs.
fn word_length_score(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.5;
    }

    let avg_len =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
    let avg_score = match avg_len as usize {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let singles = words.iter().filter(|w| w.chars().count() == 1).count() as f32;
    let single_penalty = 1.0 - (singles / words.len() as f32 * 1.5).min(0.5);

    avg_score * single_penalty
}

/// Prose sits around 10-25% whitespace.
fn whitespace_score(text: &str) -> f32 {
    let total = text.chars().count() as f32;
    let whitespace = text.chars().filter(|c| c.is_whitespace()).count() as f32;

    match (whitespace / total * 100.0) as usize {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Long runs of one character ("aaaa", "####") indicate confusion.
fn repetition_score(text: &str) -> f32 {
    let mut longest = 1;
    let mut run = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
        prev = Some(c);
    }

    match longest {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}
