//! Multi-strategy recognition: run several preprocessing/segmentation
//! approaches against one image and keep the best-scoring result.

pub mod plan;
pub mod postprocess;
pub mod scoring;
pub mod worker;

pub use plan::{ApproachPlan, RecognitionApproach};
pub use postprocess::clean_text;
pub use scoring::AttemptResult;
pub use worker::RecognitionWorker;

use crate::backend::{BackendProvider, RecognitionParams};
use crate::config::RecognitionTuning;
use crate::error::OcrError;
use crate::preprocessing::{ImageAnalysis, ImagePreprocessor};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Best result across all attempts for one image
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutcome {
    pub text: String,
    /// 0-1; zero when the text is empty
    pub confidence: f32,
    pub approach: Option<RecognitionApproach>,
    /// Approaches that produced output (successful attempts)
    pub attempts: usize,
    pub failures: usize,
    pub early_stopped: bool,
}

impl RecognitionOutcome {
    fn empty(attempts: usize, failures: usize) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            approach: None,
            attempts,
            failures,
            early_stopped: false,
        }
    }

    fn from_attempt(
        attempt: AttemptResult,
        attempts: usize,
        failures: usize,
        early_stopped: bool,
    ) -> Self {
        let confidence = if attempt.text.is_empty() {
            0.0
        } else {
            attempt.confidence()
        };
        Self {
            text: attempt.text,
            confidence,
            approach: Some(attempt.approach),
            attempts,
            failures,
            early_stopped,
        }
    }

    /// Identifier of the winning approach, or `none`
    pub fn source_approach(&self) -> String {
        self.approach
            .map(|a| a.id())
            .unwrap_or_else(|| "none".to_string())
    }
}

pub struct MultiStrategyRecognizer {
    preprocessor: Arc<ImagePreprocessor>,
    provider: Arc<dyn BackendProvider>,
    tuning: RecognitionTuning,
}

impl MultiStrategyRecognizer {
    pub fn new(
        preprocessor: Arc<ImagePreprocessor>,
        provider: Arc<dyn BackendProvider>,
        tuning: RecognitionTuning,
    ) -> Self {
        Self {
            preprocessor,
            provider,
            tuning,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn tuning(&self) -> &RecognitionTuning {
        &self.tuning
    }

    pub fn plan_for(&self, analysis: Option<&ImageAnalysis>) -> ApproachPlan {
        ApproachPlan::build(analysis, self.preprocessor.tuning().small_dimension)
    }

    /// A fresh worker bound to this recognizer's backend provider
    pub fn worker(&self) -> RecognitionWorker<'_> {
        RecognitionWorker::new(self.provider.as_ref())
    }

    /// Blocking. Decode and recognize an encoded raster image in its own worker.
    pub fn recognize_bytes(&self, bytes: &[u8]) -> RecognitionOutcome {
        let mut worker = self.worker();
        self.recognize_with(&mut worker, self.preprocessor.decode(bytes))
    }

    /// Blocking. Recognize an already decoded image in its own worker.
    pub fn recognize_image(&self, image: DynamicImage) -> RecognitionOutcome {
        let mut worker = self.worker();
        self.recognize_with(&mut worker, Ok(image))
    }

    /// Blocking. Run the approach plan through `worker`.
    ///
    /// A decode failure does not short-circuit: each planned approach records
    /// it as its own failure and the outcome is empty.
    pub fn recognize_with(
        &self,
        worker: &mut RecognitionWorker<'_>,
        decoded: Result<DynamicImage, OcrError>,
    ) -> RecognitionOutcome {
        let start = Instant::now();
        let analysis = decoded.as_ref().ok().map(|img| self.preprocessor.analyze(img));
        let plan = self.plan_for(analysis.as_ref());

        info!(
            "Recognizing with {} primary approaches ({} fallback)",
            plan.primary.len(),
            plan.fallback.len()
        );

        let mut attempts: Vec<AttemptResult> = Vec::new();
        let mut failures = 0usize;

        let mut tiers = vec![&plan.primary, &plan.fallback].into_iter();
        while let Some(tier) = tiers.next() {
            for approach in tier {
                match self.attempt(worker, &decoded, analysis.as_ref(), approach) {
                    Ok(attempt) => {
                        debug!(
                            "Approach {} produced {} chars at {:.1}%",
                            approach.id(),
                            attempt.text_length,
                            attempt.confidence_percent
                        );
                        if self.is_early_stop(&attempt) {
                            info!(
                                "Early stop on {} after {}ms",
                                approach.id(),
                                start.elapsed().as_millis()
                            );
                            return RecognitionOutcome::from_attempt(
                                attempt,
                                attempts.len() + 1,
                                failures,
                                true,
                            );
                        }
                        attempts.push(attempt);
                    }
                    Err(e) => {
                        warn!("Approach {} failed: {}", approach.id(), e);
                        failures += 1;
                    }
                }
            }

            // Later tiers only run while nothing has produced text
            if attempts.iter().any(|a| !a.text.is_empty()) {
                break;
            }
            if tiers.len() > 0 {
                debug!("No approach produced text yet, trying fallback tier");
            }
        }

        let outcome = self.select_best(attempts, failures);
        info!(
            "Recognized {} chars via {} in {}ms",
            outcome.text.chars().count(),
            outcome.source_approach(),
            start.elapsed().as_millis()
        );
        outcome
    }

    fn attempt(
        &self,
        worker: &mut RecognitionWorker<'_>,
        decoded: &Result<DynamicImage, OcrError>,
        analysis: Option<&ImageAnalysis>,
        approach: &RecognitionApproach,
    ) -> Result<AttemptResult, OcrError> {
        let image = match decoded {
            Ok(image) => image.clone(),
            Err(OcrError::Decode(msg)) => return Err(OcrError::Decode(msg.clone())),
            Err(other) => return Err(OcrError::Decode(other.to_string())),
        };

        let technique = match analysis {
            Some(analysis) => self.preprocessor.resolve(approach.technique, analysis),
            None => approach.technique,
        };
        let prepared = self.preprocessor.preprocess_image(image, technique)?;

        let params = RecognitionParams {
            segmentation: approach.segmentation,
            char_whitelist: &self.tuning.char_whitelist,
        };
        let output = worker.recognize(&prepared.image, &params)?;

        Ok(AttemptResult::new(
            *approach,
            clean_text(&output.text),
            output.confidence_percent,
        ))
    }

    fn is_early_stop(&self, attempt: &AttemptResult) -> bool {
        attempt.confidence_percent > self.tuning.early_stop_confidence
            && attempt.text_length > self.tuning.early_stop_min_length
    }

    /// Highest score wins; ties go to the earlier attempt.
    fn select_best(&self, attempts: Vec<AttemptResult>, failures: usize) -> RecognitionOutcome {
        let count = attempts.len();
        let mut best: Option<(f32, usize)> = None;

        for (i, attempt) in attempts.iter().enumerate() {
            let score = scoring::score(attempt, &self.tuning);
            debug!("Score for {}: {:.3}", attempt.approach.id(), score);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, i));
            }
        }

        match best.and_then(|(_, i)| attempts.into_iter().nth(i)) {
            Some(winner) => RecognitionOutcome::from_attempt(winner, count, failures, false),
            None => {
                warn!("All {} recognition approaches failed", failures);
                RecognitionOutcome::empty(count, failures)
            }
        }
    }
}
