use async_trait::async_trait;

use crate::domain::{JobId, TranscriptRecord};

/// History storage for finished jobs. The engine only ever calls `save`;
/// the remaining operations back the history endpoints. Record lifecycle
/// (eviction, retention) belongs to the store's owner, not the engine.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(&self, record: &TranscriptRecord) -> Result<(), StoreError>;

    async fn get(&self, id: JobId) -> Result<Option<TranscriptRecord>, StoreError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<TranscriptRecord>, StoreError>;

    async fn delete(&self, id: JobId) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}
