use crate::error::OcrError;
use image::DynamicImage;
use imageproc::filter::filter3x3;

/// Laplacian sharpening with adjustable intensity.
///
/// Kernel is the identity plus `intensity` times the negated 4-neighbour
/// Laplacian; intensity 1.0 gives the classic [0,-1,0,-1,5,-1,0,-1,0].
pub fn apply(image: DynamicImage, intensity: f32) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let k = intensity.max(0.0);
    let kernel: [f32; 9] = [0.0, -k, 0.0, -k, 1.0 + 4.0 * k, -k, 0.0, -k, 0.0];

    let sharpened = filter3x3(&gray, &kernel);
    Ok(DynamicImage::ImageLuma8(sharpened))
}
