use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{StoreError, TranscriptStore};
use crate::domain::{JobId, TranscriptRecord};

/// Process-lifetime history store. The engine holds no durable state, so
/// an in-memory map is the reference implementation of the storage seam;
/// a durable backend can replace it behind the same port.
pub struct InMemoryTranscriptStore {
    records: RwLock<Vec<TranscriptRecord>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TranscriptRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<TranscriptRecord>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for InMemoryTranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn save(&self, record: &TranscriptRecord) -> Result<(), StoreError> {
        let mut records = self.write();
        records.retain(|r| r.id != record.id);
        records.push(record.clone());
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<TranscriptRecord>, StoreError> {
        Ok(self.read().iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<TranscriptRecord>, StoreError> {
        let mut records = self.read().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, id: JobId) -> Result<(), StoreError> {
        self.write().retain(|r| r.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.write().clear();
        Ok(())
    }
}
