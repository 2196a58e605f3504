//! Raster image XObjects embedded in PDF pages

use crate::error::OcrError;
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Guard against cyclic Parent chains
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Image XObjects drawn on `page_id`, including resources inherited from
/// ancestor page-tree nodes.
pub fn page_image_streams(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(resources) = page_resources(doc, page_id) else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| resolve(doc, obj))
        .filter_map(|obj| obj.as_stream().ok())
        .filter(|stream| is_image(stream))
        .collect()
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources)?.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).ok(),
        Err(_) => Some(obj),
    }
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(|s| s.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

/// Pixel area declared in the image dictionary
pub fn declared_area(stream: &Stream) -> u64 {
    let dim = |key: &[u8]| {
        stream
            .dict
            .get(key)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
            .max(0) as u64
    };
    dim(b"Width").saturating_mul(dim(b"Height"))
}

fn filter_names(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode an image XObject into pixels.
///
/// JPEG streams are handed to the image decoder as-is; raw samples are
/// interpreted according to the declared color space.
pub fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage, OcrError> {
    if filter_names(stream).iter().any(|f| f == b"DCTDecode") {
        return image::load_from_memory(&stream.content)
            .map_err(|e| OcrError::Pdf(format!("Failed to decode JPEG image: {}", e)));
    }

    let width = dimension(stream, b"Width", "width")?;
    let height = dimension(stream, b"Height", "height")?;

    let data = if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| OcrError::Pdf(format!("Failed to decompress image: {}", e)))?
    } else {
        stream.content.clone()
    };

    let color_space = color_space_name(doc, stream);
    let bits_per_component = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8) as u8;

    tracing::debug!(
        "PDF image: {}x{}, {} bits, color_space={}, data_len={}",
        width,
        height,
        bits_per_component,
        color_space,
        data.len()
    );

    if bits_per_component != 8 {
        return Err(OcrError::Pdf(format!(
            "Unsupported bits per component: {}",
            bits_per_component
        )));
    }

    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| too_large(width, height))?;
    match color_space.as_str() {
        "DeviceGray" | "CalGray" => {
            let data = take_samples(data, pixels, 1, "grayscale")?;
            image::GrayImage::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| OcrError::Pdf("Invalid grayscale image data".to_string()))
        }
        // ICCBased with 3 components is typically RGB
        "DeviceRGB" | "CalRGB" | "ICCBased" => {
            let data = take_samples(data, pixels, 3, "RGB")?;
            image::RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| OcrError::Pdf("Invalid RGB image data".to_string()))
        }
        "DeviceCMYK" => {
            let data = take_samples(data, pixels, 4, "CMYK")?;
            let rgb = cmyk_to_rgb(&data);
            image::RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| OcrError::Pdf("Invalid CMYK->RGB conversion".to_string()))
        }
        other => Err(OcrError::Pdf(format!("Unsupported color space: {}", other))),
    }
}

/// Positive dimension that fits in a `u32`
fn dimension(stream: &Stream, key: &[u8], label: &str) -> Result<u32, OcrError> {
    let value = stream
        .dict
        .get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .ok_or_else(|| OcrError::Pdf(format!("Missing image {}", label)))?;

    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| OcrError::Pdf(format!("Invalid image {}: {}", label, value)))
}

fn too_large(width: u32, height: u32) -> OcrError {
    OcrError::Pdf(format!("Image dimensions too large: {}x{}", width, height))
}

fn take_samples(
    mut data: Vec<u8>,
    pixels: usize,
    components: usize,
    label: &str,
) -> Result<Vec<u8>, OcrError> {
    let expected = pixels.checked_mul(components).ok_or_else(|| {
        OcrError::Pdf(format!("{} image sample count overflows", label))
    })?;
    if data.len() < expected {
        return Err(OcrError::Pdf(format!(
            "Truncated {} image: data_len={}, expected={}",
            label,
            data.len(),
            expected
        )));
    }
    data.truncate(expected);
    Ok(data)
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
    for chunk in data.chunks_exact(4) {
        let k = 1.0 - chunk[3] as f32 / 255.0;
        for &channel in &chunk[..3] {
            rgb.push(((1.0 - channel as f32 / 255.0) * k * 255.0) as u8);
        }
    }
    rgb
}

/// Color space name from an image dictionary, resolving indirect references
/// and taking the family name of array forms like `[/ICCBased 5 0 R]`.
fn color_space_name(doc: &Document, stream: &Stream) -> String {
    let Some(obj) = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|obj| resolve(doc, obj))
    else {
        return "DeviceRGB".to_string();
    };

    let name = match obj {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(items) => items.first().and_then(|first| first.as_name().ok()),
        _ => None,
    };

    name.map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_else(|| "DeviceRGB".to_string())
}
