//! OCR backend implementations
//!
//! This module contains implementations of the BackendProvider trait for
//! different OCR libraries. Backends are conditionally compiled based on
//! feature flags.

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod download;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::backend::BackendProvider;
use crate::config::{BackendKind, Config};
use crate::error::OcrError;
use std::sync::Arc;

/// Build the provider for the configured backend
pub fn create_provider(config: &Config) -> Result<Arc<dyn BackendProvider>, OcrError> {
    match config.backend {
        BackendKind::Ocrs => {
            #[cfg(feature = "engine-ocrs")]
            {
                tracing::info!("Initializing ocrs backend...");
                return Ok(Arc::new(ocrs::OcrsProvider::new(config)?));
            }
            #[cfg(not(feature = "engine-ocrs"))]
            Err(unavailable(BackendKind::Ocrs, "engine-ocrs"))
        }
        BackendKind::Leptess => {
            #[cfg(feature = "engine-leptess")]
            {
                tracing::info!("Initializing leptess backend...");
                return Ok(Arc::new(leptess::LeptessProvider::new(config)?));
            }
            #[cfg(not(feature = "engine-leptess"))]
            Err(unavailable(BackendKind::Leptess, "engine-leptess"))
        }
    }
}

/// Names of the backends compiled into this build
pub fn available() -> Vec<&'static str> {
    let mut names = Vec::new();
    if cfg!(feature = "engine-ocrs") {
        names.push(BackendKind::Ocrs.as_str());
    }
    if cfg!(feature = "engine-leptess") {
        names.push(BackendKind::Leptess.as_str());
    }
    names
}

#[allow(dead_code)]
fn unavailable(kind: BackendKind, feature: &str) -> OcrError {
    OcrError::Initialization(format!(
        "Backend '{}' is not available. Build with --features {}",
        kind.as_str(),
        feature
    ))
}
