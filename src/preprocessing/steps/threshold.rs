use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// How the binarization level is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMode {
    Fixed(u8),
    /// Level = mean luminance * ratio
    BrightnessAdaptive { ratio: f32 },
}

/// Binarize: pixels above the level become white, the rest black
pub fn apply(image: DynamicImage, mode: ThresholdMode) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let level = match mode {
        ThresholdMode::Fixed(level) => level,
        ThresholdMode::BrightnessAdaptive { ratio } => {
            (mean_luminance(&gray) * ratio).round().clamp(0.0, 255.0) as u8
        }
    };

    let binarized = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    Ok(DynamicImage::ImageLuma8(binarized))
}

fn mean_luminance(img: &GrayImage) -> f32 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    sum as f32 / count as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_output_is_binary() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));

        let result = apply(DynamicImage::ImageLuma8(img), ThresholdMode::Fixed(128)).unwrap();

        for pixel in result.to_luma8().pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_adaptive_level_follows_brightness() {
        // Faded page: background 200, text 170. A fixed 128 level loses the text.
        let mut img = GrayImage::from_pixel(40, 10, Luma([200]));
        for x in 5..35 {
            img.put_pixel(x, 5, Luma([170]));
        }

        let fixed = apply(DynamicImage::ImageLuma8(img.clone()), ThresholdMode::Fixed(128))
            .unwrap()
            .to_luma8();
        assert_eq!(fixed.get_pixel(20, 5).0[0], 255);

        let adaptive = apply(
            DynamicImage::ImageLuma8(img),
            ThresholdMode::BrightnessAdaptive { ratio: 0.9 },
        )
        .unwrap()
        .to_luma8();
        assert_eq!(adaptive.get_pixel(20, 5).0[0], 0);
        assert_eq!(adaptive.get_pixel(20, 1).0[0], 255);
    }
}
