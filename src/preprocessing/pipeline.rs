use crate::config::PreprocessingTuning;
use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

use super::steps;
use super::steps::threshold::ThresholdMode;

/// Preprocessing applied before a recognition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingTechnique {
    /// Size normalization only
    None,
    /// Linear contrast/brightness remap
    Contrast,
    /// Binarization
    Threshold,
    Sharpen,
    Denoise,
    /// Contrast, then denoise, then light sharpen
    MultiStageEnhance,
    /// Resolved from image analysis before running
    Adaptive,
}

impl PreprocessingTechnique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Contrast => "contrast",
            Self::Threshold => "threshold",
            Self::Sharpen => "sharpen",
            Self::Denoise => "denoise",
            Self::MultiStageEnhance => "multi_stage",
            Self::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for PreprocessingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// Concrete technique that ran (never `Adaptive`)
    pub technique: PreprocessingTechnique,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Runs the steps of one concrete technique
pub struct Pipeline<'a> {
    tuning: &'a PreprocessingTuning,
}

impl<'a> Pipeline<'a> {
    pub fn new(tuning: &'a PreprocessingTuning) -> Self {
        Self { tuning }
    }

    /// Normalize size, then apply `technique`.
    pub fn process(
        &self,
        image: DynamicImage,
        technique: PreprocessingTechnique,
    ) -> Result<PreprocessingResult, OcrError> {
        if technique == PreprocessingTechnique::Adaptive {
            return Err(OcrError::Internal(
                "adaptive technique must be resolved before running the pipeline".to_string(),
            ));
        }

        let start = Instant::now();
        let mut timings = Vec::new();
        let t = self.tuning;

        let mut img = self.run_step("resize", image, &mut timings, |img| {
            steps::resize::apply(img, t.min_edge, t.max_edge)
        })?;

        if technique != PreprocessingTechnique::None {
            img = self.run_step("grayscale", img, &mut timings, steps::grayscale::apply)?;
        }

        img = match technique {
            PreprocessingTechnique::None | PreprocessingTechnique::Adaptive => img,
            PreprocessingTechnique::Contrast => self.run_step("contrast", img, &mut timings, |img| {
                steps::contrast::apply(img, t.contrast_boost, t.brightness_lift)
            })?,
            PreprocessingTechnique::Threshold => {
                let mode = if t.adaptive_threshold {
                    ThresholdMode::BrightnessAdaptive {
                        ratio: t.adaptive_threshold_ratio,
                    }
                } else {
                    ThresholdMode::Fixed(t.fixed_threshold)
                };
                self.run_step("threshold", img, &mut timings, |img| {
                    steps::threshold::apply(img, mode)
                })?
            }
            PreprocessingTechnique::Sharpen => self.run_step("sharpen", img, &mut timings, |img| {
                steps::sharpen::apply(img, t.sharpen_intensity)
            })?,
            PreprocessingTechnique::Denoise => {
                self.run_step("denoise", img, &mut timings, steps::denoise::apply)?
            }
            PreprocessingTechnique::MultiStageEnhance => {
                let img = self.run_step("contrast", img, &mut timings, |img| {
                    steps::contrast::apply(img, t.contrast_boost, 0)
                })?;
                let img = self.run_step("denoise", img, &mut timings, steps::denoise::apply)?;
                self.run_step("sharpen", img, &mut timings, |img| {
                    steps::sharpen::apply(img, t.light_sharpen_intensity)
                })?
            }
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Preprocessed with {} in {}ms ({} steps)",
            technique,
            total_time_ms,
            timings.len()
        );

        Ok(PreprocessingResult {
            image: img,
            technique,
            total_time_ms,
            steps: timings,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
