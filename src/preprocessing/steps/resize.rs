use crate::error::OcrError;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Normalize image size for recognition.
///
/// Upscales until the shorter edge reaches `min_edge`, then caps the longer
/// edge at `max_edge`; the cap wins when both cannot hold. Aspect ratio is
/// preserved.
pub fn apply(image: DynamicImage, min_edge: u32, max_edge: u32) -> Result<DynamicImage, OcrError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OcrError::Decode("Image has no pixels".to_string()));
    }

    let (new_width, new_height) = target_dimensions(width, height, min_edge, max_edge);
    if (new_width, new_height) == (width, height) {
        return Ok(image);
    }

    tracing::trace!(
        "Resizing {}x{} -> {}x{}",
        width,
        height,
        new_width,
        new_height
    );
    Ok(image.resize_exact(new_width, new_height, FilterType::Lanczos3))
}

pub fn target_dimensions(width: u32, height: u32, min_edge: u32, max_edge: u32) -> (u32, u32) {
    let short = width.min(height) as f32;
    let long = width.max(height) as f32;

    let mut scale = 1.0_f32;
    if short < min_edge as f32 {
        scale = min_edge as f32 / short;
    }
    if long * scale > max_edge as f32 {
        scale = max_edge as f32 / long;
    }

    if (scale - 1.0).abs() < f32::EPSILON {
        return (width, height);
    }

    let scaled = |v: u32| ((v as f32 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}
