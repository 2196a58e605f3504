use crate::backends;
use crate::config::{Config, Tuning};
use crate::document::{DocumentBuffer, DocumentCategory, OcrRecognitionResult};
use crate::engines::EngineInfo;
use crate::error::OcrError;
use crate::service::DocumentProcessingService;
use crate::store::MessageKey;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

const DEFAULT_SESSION: &str = "default";
/// Request bodies may carry this many maximum-size documents
const MAX_DOCUMENTS_PER_REQUEST: usize = 8;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DocumentProcessingService>,
    pub config: Arc<Config>,
    /// Name of the OCR backend behind the service
    pub backend: &'static str,
    next_message: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(service: DocumentProcessingService, config: Config, backend: &'static str) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            backend,
            next_message: Arc::new(AtomicU64::new(1)),
        }
    }

    fn generate_message_id(&self) -> String {
        format!("msg-{}", self.next_message.fetch_add(1, Ordering::Relaxed))
    }
}

/// One recognized upload
#[derive(Serialize)]
pub struct DocumentResult {
    pub filename: Option<String>,
    #[serde(flatten)]
    pub result: OcrRecognitionResult,
}

/// OCR response
#[derive(Serialize)]
pub struct OcrResponse {
    pub session_id: String,
    pub message_id: String,
    pub results: Vec<DocumentResult>,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
pub struct ContextResponse {
    pub session_id: String,
    pub context: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub backend: String,
    pub available_backends: Vec<&'static str>,
    pub engines: Vec<EngineInfo>,
    pub categories: Vec<DocumentCategory>,
    pub max_file_size_bytes: usize,
    pub language: String,
    pub tuning: Tuning,
}

/// Build the router with all routes and layers
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_file_size
        .saturating_mul(MAX_DOCUMENTS_PER_REQUEST);

    Router::new()
        .route("/ocr", post(handle_ocr))
        .route("/sessions/:session_id/context", get(handle_context))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let service = DocumentProcessingService::from_config(&config)?;
    let addr = format!("{}:{}", config.host, config.port);
    let backend = config.backend.as_str();

    let app = router(AppState::new(service, config, backend));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

struct Upload {
    filename: Option<String>,
    buffer: DocumentBuffer,
}

/// Handle OCR requests
async fn handle_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let start = Instant::now();

    let mut uploads: Vec<Upload> = Vec::new();
    let mut session_id: Option<String> = None;
    let mut message_id: Option<String> = None;
    let mut category: Option<DocumentCategory> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?;

                if data.len() > state.config.max_file_size {
                    return Err(OcrError::DocumentTooLarge {
                        size: data.len(),
                        max: state.config.max_file_size,
                    });
                }

                uploads.push(Upload {
                    filename,
                    buffer: DocumentBuffer::new(data.to_vec(), content_type),
                });
            }
            "session_id" => session_id = Some(text_field(field, "session_id").await?),
            "message_id" => message_id = Some(text_field(field, "message_id").await?),
            "category" => {
                category = Some(DocumentCategory::from_label(
                    &text_field(field, "category").await?,
                ))
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    if uploads.is_empty() {
        return Err(OcrError::MissingFile);
    }

    let key = MessageKey::new(
        session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION.to_string()),
        message_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| state.generate_message_id()),
    );

    let buffers: Vec<DocumentBuffer> = uploads.iter().map(|u| u.buffer.clone()).collect();
    let outcomes = state.service.process_many(&buffers, &key, category).await;

    let results = uploads
        .into_iter()
        .zip(outcomes)
        .map(|(upload, outcome)| {
            outcome.map(|result| DocumentResult {
                filename: upload.filename,
                result,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "OCR completed in {}ms for {} documents ({}/{})",
        processing_time_ms,
        results.len(),
        key.session_id,
        key.message_id
    );

    Ok(Json(OcrResponse {
        session_id: key.session_id,
        message_id: key.message_id,
        results,
        processing_time_ms,
    }))
}

async fn text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, OcrError> {
    field
        .text()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Invalid {}: {}", name, e)))
}

/// Stored recognized text for a session, ready to hand to a chat model
async fn handle_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ContextResponse>, OcrError> {
    let context = state.service.context_for(&session_id).await?;
    Ok(Json(ContextResponse {
        session_id,
        context,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.to_string(),
        available_backends: backends::available(),
        engines: state.service.factory().info(),
        categories: DocumentCategory::ALL.to_vec(),
        max_file_size_bytes: state.config.max_file_size,
        language: state.config.language.clone(),
        tuning: state.config.tuning.clone(),
    })
}
