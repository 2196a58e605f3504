//! End-to-end recognition through the processing service with a scripted
//! backend.

mod common;

use common::{
    bright_page, dark_small_photo, png_bytes, service_with, text_pdf, ScriptedProvider, Step,
};
use docrecog::backend::SegmentationMode;
use docrecog::store::{MessageKey, OcrResultStore};
use docrecog::{DocumentBuffer, DocumentCategory};

fn png_buffer(image: &image::DynamicImage) -> DocumentBuffer {
    DocumentBuffer::new(png_bytes(image), Some("image/png".to_string()))
}

fn key() -> MessageKey {
    MessageKey::new("session-1", "message-1")
}

#[tokio::test]
async fn test_clean_page_stops_after_first_confident_attempt() {
    let provider = ScriptedProvider::new(vec![Step::Text("Invoice number 12345 total due", 91.0)]);
    let (service, store) = service_with(&provider);

    let result = service
        .process(&png_buffer(&bright_page()), &key(), None)
        .await
        .unwrap();

    assert_eq!(result.recognized_text, "Invoice number 12345 total due");
    assert!((result.confidence - 0.91).abs() < 1e-6);
    assert_eq!(result.document_category, DocumentCategory::Printed);
    assert_eq!(result.source_approach, "adaptive/block");
    assert_eq!(provider.calls(), 1, "early stop should skip the second approach");
    assert_eq!(store.results_for(&key()).await.len(), 1);
}

#[tokio::test]
async fn test_clean_page_without_early_stop_tries_two_approaches() {
    let provider = ScriptedProvider::new(vec![
        Step::Text("Invoice", 60.0),
        Step::Text("Invoice number 12345", 60.0),
    ]);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(&png_buffer(&bright_page()), &key(), None)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(result.recognized_text, "Invoice number 12345");
    assert_eq!(result.source_approach, "none/block");
}

#[tokio::test]
async fn test_dark_small_photo_runs_five_approaches_and_keeps_best() {
    let provider = ScriptedProvider::new(vec![
        Step::Text("Tlie", 40.0),
        Step::Text("Th qu1ck", 45.0),
        Step::Text("The quick brown fox jumps", 70.0),
        Step::Text("The qu", 60.0),
        Step::Text("The quick brown", 65.0),
    ]);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(&png_buffer(&dark_small_photo()), &key(), None)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 5);
    assert_eq!(result.recognized_text, "The quick brown fox jumps");
    assert!((result.confidence - 0.70).abs() < 1e-6);
    assert_eq!(result.source_approach, "contrast/block");
    assert_eq!(provider.segmentations()[4], SegmentationMode::SparseText);
}

#[tokio::test]
async fn test_text_pdf_uses_embedded_text() {
    let provider = ScriptedProvider::constant("should not be used", 99.0);
    let (service, _store) = service_with(&provider);
    let buffer = DocumentBuffer::new(text_pdf("Hello World"), Some("application/pdf".to_string()));

    let result = service.process(&buffer, &key(), None).await.unwrap();

    assert_eq!(result.document_category, DocumentCategory::Pdf);
    assert!(
        result.recognized_text.contains("Hello"),
        "got {:?}",
        result.recognized_text
    );
    assert!(result.recognized_text.contains("World"));
    assert_eq!(result.confidence, 1.0);
    assert_eq!(provider.created(), 0, "no page should be rasterized for OCR");
}

#[tokio::test]
async fn test_corrupt_image_yields_empty_result() {
    let provider = ScriptedProvider::constant("never", 99.0);
    let (service, store) = service_with(&provider);
    let buffer = DocumentBuffer::new(
        b"\x89PNG but then nothing useful".to_vec(),
        Some("image/png".to_string()),
    );

    let result = service.process(&buffer, &key(), None).await.unwrap();

    assert_eq!(result.recognized_text, "");
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.source_approach, "none");
    assert_eq!(provider.calls(), 0);
    // stored even though empty, but left out of the context
    assert_eq!(store.results_for(&key()).await.len(), 1);
    assert_eq!(store.context_for("session-1").await.unwrap(), "");
}

#[tokio::test]
async fn test_all_empty_primary_falls_back_to_automatic_layout() {
    let provider = ScriptedProvider::new(vec![
        Step::Fail("backend crashed"),
        Step::Text("", 0.0),
        Step::Text("Receipt 42", 50.0),
    ]);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(&png_buffer(&bright_page()), &key(), None)
        .await
        .unwrap();

    assert_eq!(result.recognized_text, "Receipt 42");
    assert_eq!(result.source_approach, "adaptive/auto");
    assert_eq!(
        provider.segmentations(),
        vec![
            SegmentationMode::UniformBlock,
            SegmentationMode::UniformBlock,
            SegmentationMode::Automatic,
            SegmentationMode::Automatic,
        ]
    );
}

#[tokio::test]
async fn test_pdf_routed_through_printed_category_skips_ocr() {
    let provider = ScriptedProvider::constant("should not be used", 99.0);
    let (service, _store) = service_with(&provider);
    let buffer = DocumentBuffer::from_bytes(text_pdf("Quarterly report"));

    let result = service
        .process(&buffer, &key(), Some(DocumentCategory::Printed))
        .await
        .unwrap();

    assert!(result.recognized_text.contains("Quarterly"));
    assert_eq!(result.confidence, 1.0);
    assert_eq!(provider.created(), 0);
}

#[tokio::test]
async fn test_image_sent_as_pdf_category_is_recognized_as_image() {
    let provider = ScriptedProvider::constant("Scanned letter body text", 90.0);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(&png_buffer(&bright_page()), &key(), Some(DocumentCategory::Pdf))
        .await
        .unwrap();

    assert_eq!(result.document_category, DocumentCategory::Pdf);
    assert_eq!(result.recognized_text, "Scanned letter body text");
    assert_eq!(result.source_approach, "adaptive/block");
}

#[tokio::test]
async fn test_unknown_category_uses_printed_recognition() {
    let provider = ScriptedProvider::constant("Plain printed words here", 90.0);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(
            &png_buffer(&bright_page()),
            &key(),
            Some(DocumentCategory::from_label("polaroid")),
        )
        .await
        .unwrap();

    assert_eq!(result.document_category, DocumentCategory::Unknown);
    assert_eq!(result.recognized_text, "Plain printed words here");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_handwritten_category_returns_placeholder() {
    let provider = ScriptedProvider::constant("never", 99.0);
    let (service, _store) = service_with(&provider);

    let result = service
        .process(
            &png_buffer(&dark_small_photo()),
            &key(),
            Some(DocumentCategory::Handwritten),
        )
        .await
        .unwrap();

    assert!(!result.recognized_text.is_empty());
    assert!((0.30..=0.50).contains(&result.confidence));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_same_document_same_result() {
    let provider = ScriptedProvider::constant("Deterministic output text", 72.0);
    let (service, _store) = service_with(&provider);
    let buffer = png_buffer(&dark_small_photo());

    let first = service.process(&buffer, &key(), None).await.unwrap();
    let second = service.process(&buffer, &key(), None).await.unwrap();

    assert_eq!(first.recognized_text, second.recognized_text);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.source_approach, second.source_approach);
}

#[tokio::test]
async fn test_process_many_keeps_order_with_one_backend_per_document() {
    let provider = ScriptedProvider::constant("Page text that is long enough", 95.0);
    let (service, store) = service_with(&provider);
    let buffers = vec![
        png_buffer(&bright_page()),
        DocumentBuffer::from_bytes(text_pdf("Second document")),
        png_buffer(&dark_small_photo()),
    ];

    let results = service.process_many(&buffers, &key(), None).await;

    let categories: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().unwrap().document_category)
        .collect();
    assert_eq!(
        categories,
        vec![
            DocumentCategory::Printed,
            DocumentCategory::Pdf,
            DocumentCategory::Printed
        ]
    );
    assert_eq!(provider.created(), 2, "each image gets its own backend instance");
    assert_eq!(store.len().await, 3);

    // saved in completion order
    let context = service.context_for("session-1").await.unwrap();
    assert_eq!(context.matches("[Document ").count(), 3);
    assert_eq!(context.matches("printed, 95% confidence]").count(), 2);
    assert!(context.contains("pdf, 100% confidence]"));
}
