//! PDF text-layer extraction and per-page rasterization.
//!
//! Pages with an embedded text layer are returned as text. Pages without one
//! are rasterized from their largest embedded image so they can go through
//! recognition. A page that cannot be read yields a placeholder instead of
//! failing the whole document.

pub mod images;

use crate::config::PdfTuning;
use crate::document::PDF_MAGIC;
use crate::error::OcrError;
use image::imageops::FilterType;
use image::DynamicImage;
use lopdf::{Document, ObjectId};
use std::panic::{self, AssertUnwindSafe};

/// What was recovered from a single page
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Embedded text layer
    Text(String),
    /// Page image that needs recognition
    Raster(DynamicImage),
    /// Neither text nor images
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PdfPage {
    /// 1-based
    pub number: u32,
    pub content: PageContent,
}

impl PdfPage {
    /// Text standing in for a page that could not be read
    pub fn placeholder(&self) -> Option<String> {
        match &self.content {
            PageContent::Failed(reason) => {
                Some(format!("[page {} could not be read: {}]", self.number, reason))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfExtraction {
    pub pages: Vec<PdfPage>,
}

impl PdfExtraction {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_text_layer(&self) -> bool {
        self.pages
            .iter()
            .any(|p| matches!(p.content, PageContent::Text(_)))
    }

    pub fn raster_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.content, PageContent::Raster(_)))
            .count()
    }

    /// Text layers and placeholders in page order, pages separated by a blank line
    pub fn embedded_text(&self) -> String {
        self.pages
            .iter()
            .filter_map(|page| match &page.content {
                PageContent::Text(text) => Some(text.clone()),
                PageContent::Failed(_) => page.placeholder(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

#[derive(Debug, Clone)]
pub struct PdfExtractor {
    raster_scale: f32,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(&PdfTuning::default())
    }
}

impl PdfExtractor {
    pub fn new(tuning: &PdfTuning) -> Self {
        Self {
            raster_scale: tuning.raster_scale,
        }
    }

    pub fn is_pdf_format(&self, bytes: &[u8]) -> bool {
        is_pdf(bytes)
    }

    /// Embedded text of every page, with placeholders for unreadable pages.
    /// Pages without a text layer contribute nothing.
    pub fn extract_embedded_text(&self, bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.extract(bytes)?.embedded_text())
    }

    /// Walk every page, preferring its text layer and falling back to its
    /// largest embedded image.
    pub fn extract(&self, bytes: &[u8]) -> Result<PdfExtraction, OcrError> {
        if !is_pdf(bytes) {
            return Err(OcrError::Pdf("Missing %PDF- header".to_string()));
        }

        let doc = Document::load_mem(bytes)
            .map_err(|e| OcrError::Pdf(format!("Failed to load PDF: {}", e)))?;
        let page_ids = doc.get_pages();
        let layers = text_layers(bytes, page_ids.len());

        tracing::info!(
            "PDF has {} pages ({} text layer source)",
            page_ids.len(),
            if layers.is_some() { "pdf-extract" } else { "lopdf" }
        );

        let mut pages = Vec::with_capacity(page_ids.len());
        for (index, (&number, &page_id)) in page_ids.iter().enumerate() {
            let text = match &layers {
                Some(layers) => Ok(layers[index].clone()),
                None => doc
                    .extract_text(&[number])
                    .map_err(|e| OcrError::Pdf(format!("text extraction failed: {}", e))),
            };

            let content = match text {
                Ok(text) if !text.trim().is_empty() => PageContent::Text(normalize_layer(&text)),
                Ok(_) => self.raster_content(&doc, page_id, None),
                Err(e) => self.raster_content(&doc, page_id, Some(e)),
            };

            if let PageContent::Failed(reason) = &content {
                tracing::warn!("Page {} could not be read: {}", number, reason);
            }
            pages.push(PdfPage { number, content });
        }

        Ok(PdfExtraction { pages })
    }

    fn raster_content(
        &self,
        doc: &Document,
        page_id: ObjectId,
        text_error: Option<OcrError>,
    ) -> PageContent {
        match self.rasterize_page(doc, page_id) {
            Ok(Some(image)) => PageContent::Raster(image),
            Ok(None) => match text_error {
                Some(e) => PageContent::Failed(e.to_string()),
                None => PageContent::Empty,
            },
            Err(e) => PageContent::Failed(e.to_string()),
        }
    }

    /// Largest decodable image on the page, scaled by the raster factor.
    /// `Ok(None)` when the page carries no images.
    pub fn rasterize_page(
        &self,
        doc: &Document,
        page_id: ObjectId,
    ) -> Result<Option<DynamicImage>, OcrError> {
        let mut streams = images::page_image_streams(doc, page_id);
        if streams.is_empty() {
            return Ok(None);
        }
        streams.sort_by_key(|s| std::cmp::Reverse(images::declared_area(s)));

        let mut last_error = None;
        for stream in streams {
            match images::decode_image_stream(doc, stream) {
                Ok(image) => return Ok(Some(self.scale(image))),
                Err(e) => {
                    tracing::debug!("Skipping page image: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| OcrError::Pdf("no decodable page image".to_string())))
    }

    fn scale(&self, image: DynamicImage) -> DynamicImage {
        if (self.raster_scale - 1.0).abs() < f32::EPSILON || self.raster_scale <= 0.0 {
            return image;
        }
        let width = ((image.width() as f32 * self.raster_scale).round() as u32).max(1);
        let height = ((image.height() as f32 * self.raster_scale).round() as u32).max(1);
        image.resize_exact(width, height, FilterType::Triangle)
    }
}

/// Per-page text from pdf-extract, or `None` when it fails or disagrees with
/// the page count.
fn text_layers(bytes: &[u8], page_count: usize) -> Option<Vec<String>> {
    // pdf-extract panics on some malformed inputs
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(layers)) if layers.len() == page_count => Some(layers),
        Ok(Ok(layers)) => {
            tracing::debug!(
                "pdf-extract returned {} pages, expected {}",
                layers.len(),
                page_count
            );
            None
        }
        Ok(Err(e)) => {
            tracing::debug!("pdf-extract failed: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("pdf-extract panicked, using lopdf text extraction");
            None
        }
    }
}

fn normalize_layer(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
