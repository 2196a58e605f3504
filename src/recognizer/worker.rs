use crate::backend::{BackendOutput, BackendProvider, RecognitionBackend, RecognitionParams};
use crate::error::OcrError;
use image::DynamicImage;

/// Scoped owner of one backend instance.
///
/// The backend is created on first use and released when the worker is
/// dropped, so no backend state survives past the call that needed it.
pub struct RecognitionWorker<'a> {
    provider: &'a dyn BackendProvider,
    backend: Option<Box<dyn RecognitionBackend>>,
    calls: usize,
}

impl<'a> RecognitionWorker<'a> {
    pub fn new(provider: &'a dyn BackendProvider) -> Self {
        Self {
            provider,
            backend: None,
            calls: 0,
        }
    }

    pub fn recognize(
        &mut self,
        image: &DynamicImage,
        params: &RecognitionParams<'_>,
    ) -> Result<BackendOutput, OcrError> {
        self.calls += 1;
        self.backend()?.recognize(image, params)
    }

    /// Number of backend invocations made through this worker
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&mut self) -> Result<&dyn RecognitionBackend, OcrError> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => {
                tracing::debug!("Creating {} backend for worker", self.provider.name());
                self.provider.create()?
            }
        };
        Ok(&**self.backend.insert(backend))
    }
}

impl Drop for RecognitionWorker<'_> {
    fn drop(&mut self) {
        if self.backend.is_some() {
            tracing::trace!(
                "Releasing {} backend after {} calls",
                self.provider.name(),
                self.calls
            );
        }
    }
}
