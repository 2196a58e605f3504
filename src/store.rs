//! Where recognition results go once a document is processed.

use crate::document::OcrRecognitionResult;
use crate::error::OcrError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Identifies the chat message a document was attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    pub session_id: String,
    pub message_id: String,
}

impl MessageKey {
    pub fn new(session_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message_id: message_id.into(),
        }
    }
}

#[async_trait]
pub trait OcrResultStore: Send + Sync {
    async fn save(&self, result: &OcrRecognitionResult, key: &MessageKey) -> Result<(), OcrError>;

    /// Recognized text of every stored document in the session, rendered as
    /// conversational context. Empty when the session has none.
    async fn context_for(&self, session_id: &str) -> Result<String, OcrError>;
}

#[derive(Debug, Clone)]
struct StoredResult {
    message_id: String,
    result: OcrRecognitionResult,
}

/// Process-local store keyed by session
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    sessions: RwLock<HashMap<String, Vec<StoredResult>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results saved for one message, in save order
    pub async fn results_for(&self, key: &MessageKey) -> Vec<OcrRecognitionResult> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&key.session_id)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|s| s.message_id == key.message_id)
                    .map(|s| s.result.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OcrResultStore for InMemoryResultStore {
    async fn save(&self, result: &OcrRecognitionResult, key: &MessageKey) -> Result<(), OcrError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.session_id.clone())
            .or_default()
            .push(StoredResult {
                message_id: key.message_id.clone(),
                result: result.clone(),
            });
        tracing::debug!(
            "Stored {} result for {}/{}",
            result.document_category,
            key.session_id,
            key.message_id
        );
        Ok(())
    }

    async fn context_for(&self, session_id: &str) -> Result<String, OcrError> {
        let sessions = self.sessions.read().await;
        let Some(stored) = sessions.get(session_id) else {
            return Ok(String::new());
        };

        let blocks: Vec<String> = stored
            .iter()
            .filter(|s| !s.result.recognized_text.trim().is_empty())
            .enumerate()
            .map(|(i, s)| render_block(i + 1, &s.result))
            .collect();

        Ok(blocks.join("\n\n"))
    }
}

fn render_block(number: usize, result: &OcrRecognitionResult) -> String {
    format!(
        "[Document {} — {}, {}% confidence]\n{}",
        number,
        result.document_category,
        (result.confidence * 100.0).round() as u32,
        result.recognized_text
    )
}
