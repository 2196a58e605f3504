use crate::config::PreprocessingTuning;
use image::{DynamicImage, GenericImageView, Pixel};
use serde::Serialize;

/// Brightness and contrast statistics from a sampled pixel scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub avg_brightness: f32,
    /// Share of sampled pixels at or below the dark pixel level
    pub dark_ratio: f32,
    /// Share of sampled pixels at or above the light pixel level
    pub light_ratio: f32,
    pub has_good_contrast: bool,
    pub is_dark: bool,
    pub is_light: bool,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
}

impl ImageAnalysis {
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn is_small(&self, floor: u32) -> bool {
        self.min_dimension() < floor
    }
}

/// Scan a grid of at most `max_samples` pixels.
pub fn analyze(image: &DynamicImage, tuning: &PreprocessingTuning) -> ImageAnalysis {
    let (width, height) = image.dimensions();
    let step = sample_step(width, height, tuning.max_samples);

    let mut samples = 0u32;
    let mut total = 0u64;
    let mut dark = 0u32;
    let mut light = 0u32;

    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            let luma = image.get_pixel(x, y).to_luma().0[0];
            total += luma as u64;
            samples += 1;
            if luma <= tuning.dark_pixel_level {
                dark += 1;
            } else if luma >= tuning.light_pixel_level {
                light += 1;
            }
        }
    }

    let (avg_brightness, dark_ratio, light_ratio) = if samples == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let n = samples as f32;
        (total as f32 / n, dark as f32 / n, light as f32 / n)
    };

    let analysis = ImageAnalysis {
        avg_brightness,
        dark_ratio,
        light_ratio,
        has_good_contrast: (dark_ratio - light_ratio).abs() > tuning.contrast_ratio_gap,
        is_dark: avg_brightness < tuning.dark_brightness,
        is_light: avg_brightness > tuning.light_brightness,
        width,
        height,
        aspect_ratio: if height == 0 {
            0.0
        } else {
            width as f32 / height as f32
        },
    };

    tracing::debug!(
        "Analyzed {}x{} from {} samples: brightness {:.1}, dark {:.2}, light {:.2}",
        width,
        height,
        samples,
        analysis.avg_brightness,
        analysis.dark_ratio,
        analysis.light_ratio
    );

    analysis
}

/// Grid stride so that the number of visited pixels stays near `max_samples`
fn sample_step(width: u32, height: u32, max_samples: u32) -> usize {
    let pixels = width as f64 * height as f64;
    let max_samples = max_samples.max(1) as f64;
    if pixels <= max_samples {
        return 1;
    }
    (pixels / max_samples).sqrt().ceil() as usize
}
