use crate::error::OcrError;
use image::DynamicImage;

/// Convert image to 8-bit luma; every filter below works on luma
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    match image {
        DynamicImage::ImageLuma8(_) => Ok(image),
        other => Ok(DynamicImage::ImageLuma8(other.to_luma8())),
    }
}
