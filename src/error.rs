use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    /// The buffer could not be decoded as an image (or PDF page image).
    #[error("Failed to decode document: {0}")]
    Decode(String),

    /// The recognition backend failed while running an approach.
    #[error("Recognition backend failed: {0}")]
    EngineExecution(String),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to initialize OCR backend: {0}")]
    Initialization(String),

    #[error("Failed to store recognition result: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Document too large: {size} bytes (max: {max} bytes)")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::Decode(_) => "DECODE_ERROR",
            OcrError::EngineExecution(_) => "ENGINE_EXECUTION_ERROR",
            OcrError::Pdf(_) => "PDF_ERROR",
            OcrError::Initialization(_) => "INIT_ERROR",
            OcrError::Store(_) => "STORE_ERROR",
            OcrError::Config(_) => "CONFIG_ERROR",
            OcrError::DocumentTooLarge { .. } => "DOCUMENT_TOO_LARGE",
            OcrError::MissingFile => "MISSING_FILE",
            OcrError::InvalidRequest(_) => "INVALID_REQUEST",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            OcrError::Decode(_) | OcrError::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OcrError::DocumentTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            OcrError::MissingFile | OcrError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OcrError::EngineExecution(_)
            | OcrError::Initialization(_)
            | OcrError::Store(_)
            | OcrError::Config(_)
            | OcrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
