use crate::error::OcrError;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "docrecog-server")]
#[command(about = "Adaptive multi-strategy document recognition server")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "DOCRECOG_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "DOCRECOG_PORT", default_value = "9292")]
    pub port: u16,

    /// Recognition backend to run approaches with
    #[arg(long, env = "DOCRECOG_BACKEND", value_enum, default_value_t = BackendKind::default())]
    pub backend: BackendKind,

    /// Recognition language (used by the tesseract backend)
    #[arg(long, env = "DOCRECOG_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Maximum document size in bytes (default: 50MB)
    #[arg(long, env = "DOCRECOG_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Path to tessdata directory (downloaded into the cache dir if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// JSON file overriding recognition tuning constants
    #[arg(long, env = "DOCRECOG_TUNING_FILE")]
    pub tuning_file: Option<PathBuf>,

    /// Confidence percentage above which the first good attempt is accepted
    #[arg(long, env = "DOCRECOG_EARLY_STOP_CONFIDENCE")]
    pub early_stop_confidence: Option<f32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Which OCR backend executes recognition approaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ocrs,
    Leptess,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "engine-ocrs") {
            BackendKind::Ocrs
        } else {
            BackendKind::Leptess
        }
    }
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ocrs => "ocrs",
            BackendKind::Leptess => "leptess",
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub language: String,
    pub max_file_size: usize,
    pub tessdata_path: Option<String>,
    pub tuning: Tuning,
}

impl Config {
    /// Build the configuration, layering the tuning file and CLI overrides
    /// on top of the built-in tuning defaults.
    pub fn from_args(args: Args) -> Result<Self, OcrError> {
        let mut tuning = match &args.tuning_file {
            Some(path) => Tuning::from_file(path)?,
            None => Tuning::default(),
        };

        if let Some(bar) = args.early_stop_confidence {
            tuning.recognition.early_stop_confidence = bar;
        }
        tuning.validate()?;

        Ok(Self {
            host: args.host,
            port: args.port,
            backend: args.backend,
            language: args.language,
            max_file_size: args.max_file_size,
            tessdata_path: args.tessdata_path,
            tuning,
        })
    }
}

/// Tuned constants driving preprocessing selection and result scoring.
///
/// Every field has a default; a tuning file only needs the keys it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub preprocessing: PreprocessingTuning,
    pub recognition: RecognitionTuning,
    pub pdf: PdfTuning,
}

impl Tuning {
    pub fn from_file(path: &Path) -> Result<Self, OcrError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OcrError::Config(format!("Failed to read tuning file {}: {}", path.display(), e))
        })?;
        let tuning: Tuning = serde_json::from_str(&raw).map_err(|e| {
            OcrError::Config(format!("Invalid tuning file {}: {}", path.display(), e))
        })?;
        tracing::info!("Loaded recognition tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), OcrError> {
        let p = &self.preprocessing;
        let r = &self.recognition;

        if p.min_edge == 0 || p.max_edge < p.min_edge {
            return Err(OcrError::Config(format!(
                "min_edge ({}) must be positive and not exceed max_edge ({})",
                p.min_edge, p.max_edge
            )));
        }
        if p.max_samples == 0 {
            return Err(OcrError::Config("max_samples must be positive".to_string()));
        }
        if !(0.0..=100.0).contains(&r.early_stop_confidence) {
            return Err(OcrError::Config(format!(
                "early_stop_confidence must be a percentage, got {}",
                r.early_stop_confidence
            )));
        }
        if r.length_divisor <= 0.0 {
            return Err(OcrError::Config("length_divisor must be positive".to_string()));
        }
        if r.min_quality_factor > r.max_quality_factor {
            return Err(OcrError::Config(
                "min_quality_factor must not exceed max_quality_factor".to_string(),
            ));
        }
        if self.pdf.raster_scale <= 0.0 {
            return Err(OcrError::Config("pdf raster_scale must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingTuning {
    /// Average brightness below which an image counts as dark
    pub dark_brightness: f32,
    /// Average brightness above which an image counts as light
    pub light_brightness: f32,
    /// Minimum |dark_ratio - light_ratio| for good contrast
    pub contrast_ratio_gap: f32,
    /// Luminance at or below which a sampled pixel counts as dark
    pub dark_pixel_level: u8,
    /// Luminance at or above which a sampled pixel counts as light
    pub light_pixel_level: u8,
    /// Upper bound on pixels visited by the analysis scan
    pub max_samples: u32,
    /// Images whose smaller edge is below this are treated as small
    pub small_dimension: u32,
    pub min_edge: u32,
    pub max_edge: u32,
    /// Contrast increase in percent for the contrast remap
    pub contrast_boost: f32,
    /// Brightness added when remapping dark images
    pub brightness_lift: i32,
    /// Binarize at average brightness * ratio instead of the fixed level
    pub adaptive_threshold: bool,
    pub fixed_threshold: u8,
    /// Adaptive threshold = average brightness * this ratio
    pub adaptive_threshold_ratio: f32,
    pub sharpen_intensity: f32,
    /// Sharpen intensity used as the last multi-stage step
    pub light_sharpen_intensity: f32,
}

impl Default for PreprocessingTuning {
    fn default() -> Self {
        Self {
            dark_brightness: 120.0,
            light_brightness: 180.0,
            contrast_ratio_gap: 0.3,
            dark_pixel_level: 50,
            light_pixel_level: 200,
            max_samples: 10_000,
            small_dimension: 800,
            min_edge: 1000,
            max_edge: 4000,
            contrast_boost: 40.0,
            brightness_lift: 25,
            adaptive_threshold: true,
            fixed_threshold: 128,
            adaptive_threshold_ratio: 0.9,
            sharpen_intensity: 1.0,
            light_sharpen_intensity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionTuning {
    /// Raw confidence percentage that must be exceeded to stop early
    pub early_stop_confidence: f32,
    /// Cleaned text length that must be exceeded to stop early
    pub early_stop_min_length: usize,
    pub length_divisor: f32,
    pub max_length_factor: f32,
    pub min_quality_factor: f32,
    pub max_quality_factor: f32,
    /// Share of artifact characters above which the quality penalty applies
    pub artifact_ratio_limit: f32,
    /// Characters the backend may emit
    pub char_whitelist: String,
}

pub const DEFAULT_CHAR_WHITELIST: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
    "0123456789",
    "ÁÉÍÓÚÜÑáéíóúüñÀÈÌÒÙàèìòùÇç",
    " .,;:!?¿¡'\"()-/%&@#+=*$€"
);

impl Default for RecognitionTuning {
    fn default() -> Self {
        Self {
            early_stop_confidence: 85.0,
            early_stop_min_length: 10,
            length_divisor: 20.0,
            max_length_factor: 2.0,
            min_quality_factor: 0.1,
            max_quality_factor: 2.0,
            artifact_ratio_limit: 0.1,
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfTuning {
    /// Upscale factor applied when rasterizing a page for OCR
    pub raster_scale: f32,
}

impl Default for PdfTuning {
    fn default() -> Self {
        Self { raster_scale: 2.0 }
    }
}
