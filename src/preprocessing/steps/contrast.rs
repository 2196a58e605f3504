use crate::error::OcrError;
use image::{imageops, DynamicImage};

/// Linear contrast/brightness remap around mid-gray.
///
/// `contrast_pct` > 0 stretches values away from 128; `brightness` is added
/// afterwards and saturates at the ends of the range.
pub fn apply(image: DynamicImage, contrast_pct: f32, brightness: i32) -> Result<DynamicImage, OcrError> {
    let mut remapped = image.to_luma8();
    if contrast_pct != 0.0 {
        remapped = imageops::contrast(&remapped, contrast_pct);
    }
    if brightness != 0 {
        remapped = imageops::brighten(&remapped, brightness);
    }
    Ok(DynamicImage::ImageLuma8(remapped))
}
