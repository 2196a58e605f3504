//! Shared fixtures: a scripted in-process backend and synthetic documents.
#![allow(dead_code)]

use docrecog::backend::{
    BackendOutput, BackendProvider, RecognitionBackend, RecognitionParams, SegmentationMode,
};
use docrecog::config::{BackendKind, Config, Tuning};
use docrecog::store::InMemoryResultStore;
use docrecog::{DocumentProcessingService, OcrError};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted backend response
#[derive(Debug, Clone)]
pub enum Step {
    Text(&'static str, f32),
    Fail(&'static str),
}

/// Backend provider that replays a script shared by all its instances.
/// Once the script runs out, every call returns `fallback`.
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Step>>>,
    fallback: Step,
    calls: Arc<AtomicUsize>,
    created: Arc<AtomicUsize>,
    segmentations: Arc<Mutex<Vec<SegmentationMode>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            fallback: Step::Text("", 0.0),
            calls: Arc::new(AtomicUsize::new(0)),
            created: Arc::new(AtomicUsize::new(0)),
            segmentations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answers with the same text and confidence
    pub fn constant(text: &'static str, confidence_percent: f32) -> Self {
        Self {
            fallback: Step::Text(text, confidence_percent),
            ..Self::new(Vec::new())
        }
    }

    /// Backend recognize calls across all instances
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Backend instances created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn segmentations(&self) -> Vec<SegmentationMode> {
        self.segmentations.lock().unwrap().clone()
    }
}

struct ScriptedBackend {
    provider: ScriptedProvider,
}

impl RecognitionBackend for ScriptedBackend {
    fn recognize(
        &self,
        _image: &DynamicImage,
        params: &RecognitionParams<'_>,
    ) -> Result<BackendOutput, OcrError> {
        let p = &self.provider;
        p.calls.fetch_add(1, Ordering::SeqCst);
        p.segmentations.lock().unwrap().push(params.segmentation);

        let step = p
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| p.fallback.clone());
        match step {
            Step::Text(text, confidence_percent) => Ok(BackendOutput {
                text: text.to_string(),
                confidence_percent,
            }),
            Step::Fail(msg) => Err(OcrError::EngineExecution(msg.to_string())),
        }
    }
}

impl BackendProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn description(&self) -> &'static str {
        "Scripted test backend"
    }

    fn create(&self) -> Result<Box<dyn RecognitionBackend>, OcrError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedBackend {
            provider: self.clone(),
        }))
    }
}

pub fn service_with(
    provider: &ScriptedProvider,
) -> (DocumentProcessingService, Arc<InMemoryResultStore>) {
    let store = Arc::new(InMemoryResultStore::new());
    let service = DocumentProcessingService::with_provider(
        Arc::new(provider.clone()),
        &Tuning::default(),
        store.clone(),
    );
    (service, store)
}

pub fn test_config(max_file_size: usize) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        backend: BackendKind::default(),
        language: "eng".to_string(),
        max_file_size,
        tessdata_path: None,
        tuning: Tuning::default(),
    }
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Large white page with dark text lines: bright and high contrast
pub fn bright_page() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(1000, 1200, |x, y| {
        let on_line = y % 40 < 4 && x % 12 < 8;
        Luma([if on_line { 10 } else { 250 }])
    }))
}

/// Small, dim, flat photo: dark, low contrast and below the small-image floor
pub fn dark_small_photo() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(300, 200, |x, y| {
        Luma([80 + ((x + y) % 20) as u8])
    }))
}

/// Single page PDF with an embedded text layer drawn in Courier
pub fn text_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
