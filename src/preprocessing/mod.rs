//! Image preprocessing for OCR enhancement
//!
//! Decodes raster buffers, analyzes brightness/contrast, picks a technique
//! and runs it through the step pipeline.

pub mod analysis;
pub mod pipeline;
pub mod steps;

pub use analysis::ImageAnalysis;
pub use pipeline::{Pipeline, PreprocessingResult, PreprocessingTechnique, StepTiming};

use crate::config::PreprocessingTuning;
use crate::error::OcrError;
use image::DynamicImage;

/// Stateless apart from its tuning; shared by every engine that needs it.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    tuning: PreprocessingTuning,
}

impl ImagePreprocessor {
    pub fn new(tuning: PreprocessingTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &PreprocessingTuning {
        &self.tuning
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, OcrError> {
        image::load_from_memory(bytes)
            .map_err(|e| OcrError::Decode(format!("Failed to decode image: {}", e)))
    }

    pub fn analyze(&self, image: &DynamicImage) -> ImageAnalysis {
        analysis::analyze(image, &self.tuning)
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<ImageAnalysis, OcrError> {
        Ok(self.analyze(&self.decode(bytes)?))
    }

    /// Decision tree: dark → contrast; light with poor contrast → threshold;
    /// small → sharpen; otherwise the multi-stage enhancement.
    pub fn select_technique(&self, analysis: &ImageAnalysis) -> PreprocessingTechnique {
        if analysis.is_dark {
            PreprocessingTechnique::Contrast
        } else if analysis.is_light && !analysis.has_good_contrast {
            PreprocessingTechnique::Threshold
        } else if analysis.is_small(self.tuning.small_dimension) {
            PreprocessingTechnique::Sharpen
        } else {
            PreprocessingTechnique::MultiStageEnhance
        }
    }

    /// Replace `Adaptive` with the technique the analysis calls for.
    pub fn resolve(
        &self,
        technique: PreprocessingTechnique,
        analysis: &ImageAnalysis,
    ) -> PreprocessingTechnique {
        match technique {
            PreprocessingTechnique::Adaptive => self.select_technique(analysis),
            other => other,
        }
    }

    pub fn preprocess(
        &self,
        bytes: &[u8],
        technique: PreprocessingTechnique,
    ) -> Result<PreprocessingResult, OcrError> {
        self.preprocess_image(self.decode(bytes)?, technique)
    }

    /// Run `technique` on an already decoded image, analyzing it first when
    /// the technique is `Adaptive`.
    pub fn preprocess_image(
        &self,
        image: DynamicImage,
        technique: PreprocessingTechnique,
    ) -> Result<PreprocessingResult, OcrError> {
        let technique = match technique {
            PreprocessingTechnique::Adaptive => self.select_technique(&self.analyze(&image)),
            other => other,
        };
        Pipeline::new(&self.tuning).process(image, technique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn analysis(avg: f32, good_contrast: bool, width: u32, height: u32) -> ImageAnalysis {
        let tuning = PreprocessingTuning::default();
        ImageAnalysis {
            avg_brightness: avg,
            dark_ratio: 0.0,
            light_ratio: 0.0,
            has_good_contrast: good_contrast,
            is_dark: avg < tuning.dark_brightness,
            is_light: avg > tuning.light_brightness,
            width,
            height,
            aspect_ratio: width as f32 / height as f32,
        }
    }

    #[test]
    fn test_select_technique_decision_tree() {
        let pre = ImagePreprocessor::default();

        assert_eq!(
            pre.select_technique(&analysis(90.0, true, 2000, 2000)),
            PreprocessingTechnique::Contrast
        );
        assert_eq!(
            pre.select_technique(&analysis(200.0, false, 2000, 2000)),
            PreprocessingTechnique::Threshold
        );
        assert_eq!(
            pre.select_technique(&analysis(150.0, false, 600, 2000)),
            PreprocessingTechnique::Sharpen
        );
        assert_eq!(
            pre.select_technique(&analysis(200.0, true, 2000, 2000)),
            PreprocessingTechnique::MultiStageEnhance
        );
    }

    #[test]
    fn test_dark_takes_precedence_over_small() {
        let pre = ImagePreprocessor::default();
        assert_eq!(
            pre.select_technique(&analysis(60.0, false, 300, 200)),
            PreprocessingTechnique::Contrast
        );
    }

    #[test]
    fn test_resolve_leaves_concrete_techniques_alone() {
        let pre = ImagePreprocessor::default();
        let a = analysis(90.0, true, 2000, 2000);
        assert_eq!(
            pre.resolve(PreprocessingTechnique::Adaptive, &a),
            PreprocessingTechnique::Contrast
        );
        assert_eq!(
            pre.resolve(PreprocessingTechnique::Denoise, &a),
            PreprocessingTechnique::Denoise
        );
    }

    #[test]
    fn test_decode_error_for_garbage() {
        let pre = ImagePreprocessor::default();
        let err = pre
            .preprocess(b"not an image at all", PreprocessingTechnique::None)
            .unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
    }

    #[test]
    fn test_preprocess_adaptive_resolves_from_image() {
        let pre = ImagePreprocessor::new(PreprocessingTuning {
            min_edge: 50,
            max_edge: 400,
            ..PreprocessingTuning::default()
        });
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([60])));

        let result = pre
            .preprocess_image(img, PreprocessingTechnique::Adaptive)
            .unwrap();

        assert_eq!(result.technique, PreprocessingTechnique::Contrast);
    }
}
