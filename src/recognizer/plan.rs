use crate::backend::SegmentationMode;
use crate::preprocessing::{ImageAnalysis, PreprocessingTechnique};
use serde::Serialize;

/// Segmentation used by every primary approach
pub const DEFAULT_SEGMENTATION: SegmentationMode = SegmentationMode::UniformBlock;
/// More permissive segmentation used by the fallback tier
pub const FALLBACK_SEGMENTATION: SegmentationMode = SegmentationMode::Automatic;

/// One (preprocessing, segmentation) pairing to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecognitionApproach {
    pub technique: PreprocessingTechnique,
    pub segmentation: SegmentationMode,
    pub description: &'static str,
}

impl RecognitionApproach {
    pub const fn new(
        technique: PreprocessingTechnique,
        segmentation: SegmentationMode,
        description: &'static str,
    ) -> Self {
        Self {
            technique,
            segmentation,
            description,
        }
    }

    /// Stable identifier, e.g. `adaptive/block`
    pub fn id(&self) -> String {
        format!("{}/{}", self.technique, self.segmentation)
    }
}

pub const ADAPTIVE: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::Adaptive,
    DEFAULT_SEGMENTATION,
    "adaptive preprocessing",
);
pub const ORIGINAL: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::None,
    DEFAULT_SEGMENTATION,
    "original image",
);
pub const CONTRAST: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::Contrast,
    DEFAULT_SEGMENTATION,
    "contrast enhanced for dark image",
);
pub const THRESHOLD: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::Threshold,
    DEFAULT_SEGMENTATION,
    "binarized for low contrast",
);
pub const MULTI_STAGE: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::MultiStageEnhance,
    SegmentationMode::SparseText,
    "multi-stage enhancement for small image",
);
pub const ADAPTIVE_AUTO: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::Adaptive,
    FALLBACK_SEGMENTATION,
    "adaptive preprocessing, automatic layout",
);
pub const ORIGINAL_AUTO: RecognitionApproach = RecognitionApproach::new(
    PreprocessingTechnique::None,
    FALLBACK_SEGMENTATION,
    "original image, automatic layout",
);

/// Ordered approaches for one document. The primary tier always runs (until
/// an early stop); the fallback tier only runs when no primary approach
/// produced any text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproachPlan {
    pub primary: Vec<RecognitionApproach>,
    pub fallback: Vec<RecognitionApproach>,
}

impl ApproachPlan {
    /// Build the plan from the image analysis; `None` means analysis failed
    /// and only the baseline pair is seeded.
    pub fn build(analysis: Option<&ImageAnalysis>, small_dimension: u32) -> Self {
        let mut primary = vec![ADAPTIVE, ORIGINAL];

        if let Some(analysis) = analysis {
            if analysis.is_dark {
                primary.push(CONTRAST);
            }
            if !analysis.has_good_contrast {
                primary.push(THRESHOLD);
            }
            if analysis.is_small(small_dimension) {
                primary.push(MULTI_STAGE);
            }
        }

        Self {
            primary,
            fallback: vec![ADAPTIVE_AUTO, ORIGINAL_AUTO],
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.fallback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.fallback.iter())
            .map(RecognitionApproach::id)
            .collect()
    }
}
