use super::plan::RecognitionApproach;
use crate::config::RecognitionTuning;
use crate::document::clamp_confidence;

/// Punctuation that is not counted as an artifact
const COMMON_PUNCTUATION: &str = ".,;:!?'\"-()¿¡";

/// One completed recognition attempt, after post-processing.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    pub approach: RecognitionApproach,
    pub text: String,
    /// Raw backend confidence, 0-100
    pub confidence_percent: f32,
    /// Character count of the cleaned text
    pub text_length: usize,
}

impl AttemptResult {
    pub fn new(approach: RecognitionApproach, text: String, confidence_percent: f32) -> Self {
        Self {
            approach,
            text_length: text.chars().count(),
            text,
            confidence_percent,
        }
    }

    /// Confidence normalized to 0-1
    pub fn confidence(&self) -> f32 {
        clamp_confidence(self.confidence_percent / 100.0)
    }
}

/// Longer text is more trustworthy, up to a cap.
pub fn length_factor(text_length: usize, tuning: &RecognitionTuning) -> f32 {
    (text_length as f32 / tuning.length_divisor).min(tuning.max_length_factor)
}

/// Rewards prose-like text and penalizes symbol noise.
pub fn quality_factor(text: &str, tuning: &RecognitionTuning) -> f32 {
    let mut quality = 1.0f32;
    let total = text.chars().count();

    if total > 10 {
        quality += 0.2;
    }
    if text.chars().any(char::is_uppercase) {
        quality += 0.1;
    }
    if text.split_whitespace().filter(|w| w.chars().count() > 2).count() >= 3 {
        quality += 0.2;
    }
    if total > 0 && artifact_ratio(text) > tuning.artifact_ratio_limit {
        quality -= 0.3;
    }

    quality.clamp(tuning.min_quality_factor, tuning.max_quality_factor)
}

fn artifact_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let artifacts = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !COMMON_PUNCTUATION.contains(*c))
        .count();
    artifacts as f32 / total as f32
}

/// confidence × length factor × quality factor
pub fn score(attempt: &AttemptResult, tuning: &RecognitionTuning) -> f32 {
    attempt.confidence()
        * length_factor(attempt.text_length, tuning)
        * quality_factor(&attempt.text, tuning)
}
