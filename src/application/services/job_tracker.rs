use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::{
    Chunk, ChunkStatus, Job, JobId, JobState, ProgressEntry, ProviderChoice,
};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("job not found")]
    NotFound,
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },
}

/// Consistent read-side copy of a job for polling clients.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub state: JobState,
    pub filename: String,
    pub provider: ProviderChoice,
    pub progress: Vec<ProgressEntry>,
    pub chunks_total: usize,
    pub chunks_done: usize,
    pub transcript: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Single authority for job state. Every mutation is one logical operation
/// behind one lock, so concurrent dispatcher workers serialize here and
/// pollers always observe a consistent snapshot.
pub struct JobTracker {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, job: Job) -> JobId {
        let id = job.id;
        let mut jobs = self.lock();
        jobs.insert(id, job);
        id
    }

    pub fn active_jobs(&self) -> usize {
        let jobs = self.lock();
        jobs.values().filter(|j| !j.state.is_terminal()).count()
    }

    pub fn transition(&self, id: JobId, next: JobState) -> Result<(), TrackerError> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(&id).ok_or(TrackerError::NotFound)?;
        if !job.state.can_transition_to(next) {
            return Err(TrackerError::InvalidTransition {
                from: job.state,
                to: next,
            });
        }
        tracing::debug!(job_id = %id.as_uuid(), from = %job.state, to = %next, "Job state transition");
        job.state = next;
        Ok(())
    }

    pub fn append_progress(&self, id: JobId, message: impl Into<String>) {
        let message = message.into();
        let mut jobs = self.lock();
        if let Some(job) = jobs.get_mut(&id) {
            tracing::info!(job_id = %id.as_uuid(), "{}", message);
            job.progress.push(ProgressEntry {
                at: Utc::now(),
                message,
            });
        }
    }

    /// Records the segmenter's output. Payloads are not retained here; the
    /// dispatcher owns them for the duration of transcription.
    pub fn register_chunks(&self, id: JobId, chunks: &[Chunk]) -> Result<(), TrackerError> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(&id).ok_or(TrackerError::NotFound)?;
        job.chunks = chunks
            .iter()
            .map(|c| Chunk {
                id: c.id,
                index: c.index,
                range: c.range,
                payload: Vec::new(),
                attempts: 0,
                status: ChunkStatus::Pending,
                text: None,
            })
            .collect();
        Ok(())
    }

    pub fn chunk_in_flight(&self, id: JobId, index: usize) {
        self.with_chunk(id, index, |chunk, total| {
            chunk.status = ChunkStatus::InFlight;
            chunk.attempts += 1;
            Some(format!("chunk {}/{} transcribing", index + 1, total))
        });
    }

    pub fn chunk_retrying(&self, id: JobId, index: usize, attempt: u32) {
        self.with_chunk(id, index, |chunk, total| {
            chunk.status = ChunkStatus::FailedRetryable;
            Some(format!(
                "chunk {}/{} retrying after transient error (attempt {})",
                index + 1,
                total,
                attempt
            ))
        });
    }

    pub fn chunk_succeeded(&self, id: JobId, index: usize, text: &str) {
        let text = text.to_string();
        self.with_chunk(id, index, move |chunk, total| {
            chunk.status = ChunkStatus::Succeeded;
            chunk.text = Some(text);
            Some(format!("chunk {}/{} transcribed", index + 1, total))
        });
    }

    pub fn chunk_failed(&self, id: JobId, index: usize, error: &str) {
        let error = error.to_string();
        self.with_chunk(id, index, move |chunk, total| {
            chunk.status = ChunkStatus::FailedFatal;
            Some(format!(
                "chunk {}/{} failed permanently: {}",
                index + 1,
                total,
                error
            ))
        });
    }

    /// Terminal success: transcript is set together with the `Finished`
    /// transition so no reader ever sees one without the other.
    pub fn finish(&self, id: JobId, transcript: String) -> Result<(), TrackerError> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(&id).ok_or(TrackerError::NotFound)?;
        if !job.state.can_transition_to(JobState::Finished) {
            return Err(TrackerError::InvalidTransition {
                from: job.state,
                to: JobState::Finished,
            });
        }
        job.state = JobState::Finished;
        job.transcript = Some(transcript);
        job.progress.push(ProgressEntry {
            at: Utc::now(),
            message: "Transcription successful.".to_string(),
        });
        Ok(())
    }

    /// Terminal failure, reachable from any non-terminal state.
    pub fn fail(&self, id: JobId, message: &str) -> Result<(), TrackerError> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(&id).ok_or(TrackerError::NotFound)?;
        if !job.state.can_transition_to(JobState::Error) {
            return Err(TrackerError::InvalidTransition {
                from: job.state,
                to: JobState::Error,
            });
        }
        tracing::error!(job_id = %id.as_uuid(), error = %message, "Job failed");
        job.state = JobState::Error;
        job.error_message = Some(message.to_string());
        job.progress.push(ProgressEntry {
            at: Utc::now(),
            message: format!("An error occurred: {}", message),
        });
        Ok(())
    }

    pub fn snapshot(&self, id: JobId) -> Option<JobSnapshot> {
        let jobs = self.lock();
        jobs.get(&id).map(|job| JobSnapshot {
            id: job.id,
            state: job.state,
            filename: job.filename.clone(),
            provider: job.provider,
            progress: job.progress.clone(),
            chunks_total: job.chunks.len(),
            chunks_done: job
                .chunks
                .iter()
                .filter(|c| c.status.is_terminal())
                .count(),
            transcript: job.transcript.clone(),
            error_message: job.error_message.clone(),
            created_at: job.created_at,
        })
    }

    fn with_chunk<F>(&self, id: JobId, index: usize, update: F)
    where
        F: FnOnce(&mut Chunk, usize) -> Option<String>,
    {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&id) else {
            return;
        };
        if job.state.is_terminal() {
            return;
        }
        let total = job.chunks.len();
        let Some(chunk) = job.chunks.get_mut(index) else {
            return;
        };
        if let Some(message) = update(chunk, total) {
            tracing::info!(job_id = %id.as_uuid(), "{}", message);
            job.progress.push(ProgressEntry {
                at: Utc::now(),
                message,
            });
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, Job>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
