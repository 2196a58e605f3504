use crate::error::OcrError;
use image::DynamicImage;
use imageproc::filter::box_filter;

/// 3x3 mean filter
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    Ok(DynamicImage::ImageLuma8(box_filter(&gray, 1, 1)))
}
