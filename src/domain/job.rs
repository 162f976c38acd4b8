use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Chunk, JobState, LanguageHint, ProviderChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// One end-to-end transcription request. Owned by the job tracker for its
/// whole lifetime and immutable once `state` is terminal.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub filename: String,
    pub language: LanguageHint,
    pub provider: ProviderChoice,
    pub chunks: Vec<Chunk>,
    pub progress: Vec<ProgressEntry>,
    pub transcript: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(filename: String, language: LanguageHint, provider: ProviderChoice) -> Self {
        Self {
            id: JobId::new(),
            state: JobState::Queued,
            filename,
            language,
            provider,
            chunks: Vec::new(),
            progress: Vec::new(),
            transcript: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}
