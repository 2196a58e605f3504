//! Leptess/Tesseract backend implementation
//!
//! Tesseract-based OCR. Honors segmentation modes and the character whitelist
//! natively. Uses tesseract-static for static linking (no system dependencies);
//! tessdata is downloaded on first use unless a directory is configured.

use super::download::{cache_dir, ensure_cached};
use crate::backend::{BackendOutput, BackendProvider, RecognitionBackend, RecognitionParams};
use crate::config::Config;
use crate::error::OcrError;
use image::DynamicImage;
use tesseract_static::tesseract::Tesseract;

/// Knows where tessdata lives and which language to load
pub struct LeptessProvider {
    tessdata_path: String,
    language: String,
}

impl LeptessProvider {
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let language = config.language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&language)?,
        };

        // Fail at startup rather than on the first document if tessdata is unusable
        Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            OcrError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;

        tracing::info!(
            "Leptess backend ready (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl BackendProvider for LeptessProvider {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn create(&self) -> Result<Box<dyn RecognitionBackend>, OcrError> {
        Ok(Box::new(LeptessBackend {
            tessdata_path: self.tessdata_path.clone(),
            language: self.language.clone(),
        }))
    }
}

pub struct LeptessBackend {
    tessdata_path: String,
    language: String,
}

impl RecognitionBackend for LeptessBackend {
    fn recognize(
        &self,
        image: &DynamicImage,
        params: &RecognitionParams<'_>,
    ) -> Result<BackendOutput, OcrError> {
        let rgb_img = image.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // BMP is always supported by leptonica
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| OcrError::EngineExecution(format!("Failed to convert to BMP: {}", e)))?;

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| OcrError::EngineExecution(format!("Failed to create Tesseract: {}", e)))?;

        tess = tess
            .set_variable("tessedit_pageseg_mode", &params.segmentation.psm().to_string())
            .map_err(|e| {
                OcrError::EngineExecution(format!("Failed to set segmentation mode: {}", e))
            })?;

        if !params.char_whitelist.is_empty() {
            tess = tess
                .set_variable("tessedit_char_whitelist", params.char_whitelist)
                .map_err(|e| OcrError::EngineExecution(format!("Failed to set whitelist: {}", e)))?;
        }

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::EngineExecution(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| OcrError::EngineExecution(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::EngineExecution(format!("Failed to get text: {}", e)))?;

        // mean_text_conf is already on a 0-100 scale
        let confidence_percent = tess.mean_text_conf().clamp(0, 100) as f32;

        tracing::debug!(
            "tesseract psm {} on {}x{}: {} chars at {:.0}%",
            params.segmentation.psm(),
            width,
            height,
            text.len(),
            confidence_percent
        );

        Ok(BackendOutput {
            text: text.trim().to_string(),
            confidence_percent,
        })
    }
}

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
    let dir = cache_dir().join("tessdata");
    let url = format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    );
    ensure_cached(&url, &dir, &format!("{}.traineddata", language))?;

    // Tesseract expects the directory, not the file
    dir.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::Initialization("Invalid tessdata path".to_string()))
}
