use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::application::ports::{ProviderError, TranscriptionProvider};
use crate::domain::{Chunk, JobId, LanguageHint, TimeRange};

use super::backoff::{jitter_unit, BackoffPolicy};
use super::job_tracker::JobTracker;

/// Process-wide admission control for one provider. Every chunk of every
/// active job targeting the provider draws a permit from the same semaphore,
/// so the concurrency ceiling is a shared resource limit, not per-job.
pub struct ProviderPool {
    semaphore: Arc<Semaphore>,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    pub request_timeout: Duration,
}

impl ProviderPool {
    pub fn new(
        concurrency: usize,
        max_attempts: u32,
        backoff: BackoffPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            concurrency: concurrency.max(1),
            max_attempts: max_attempts.max(1),
            backoff,
            request_timeout,
        }
    }

    async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).acquire_owned().await.ok()
    }

    /// Unclassified failures are retried, but on half the budget.
    fn attempt_budget(&self, error: &ProviderError) -> u32 {
        match error {
            ProviderError::Transient(_) => self.max_attempts,
            ProviderError::Unknown(_) => (self.max_attempts / 2).max(1),
            _ => 0,
        }
    }
}

#[derive(Debug)]
pub struct ChunkOutcome {
    pub index: usize,
    pub range: TimeRange,
    pub result: Result<String, ProviderError>,
}

/// Drives every chunk of a job to a terminal status against one provider
/// pool. Chunks run in parallel up to the pool ceiling; completion order is
/// unconstrained and outcomes are re-sorted by index before returning.
pub struct Dispatcher {
    tracker: Arc<JobTracker>,
}

impl Dispatcher {
    pub fn new(tracker: Arc<JobTracker>) -> Self {
        Self { tracker }
    }

    pub async fn dispatch(
        &self,
        job_id: JobId,
        chunks: Vec<Chunk>,
        provider: Arc<dyn TranscriptionProvider>,
        pool: Arc<ProviderPool>,
        language: LanguageHint,
        context: String,
    ) -> Vec<ChunkOutcome> {
        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let index = chunk.index;
            let range = chunk.range;
            let tracker = Arc::clone(&self.tracker);
            let provider = Arc::clone(&provider);
            let pool = Arc::clone(&pool);
            let language = language.clone();
            let context = context.clone();
            let handle = tokio::spawn(async move {
                transcribe_chunk(job_id, chunk, tracker, provider, pool, language, context).await
            });
            handles.push((index, range, handle));
        }

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(index, range, handle)| async move { (index, range, handle.await) }),
        )
        .await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for (index, range, result) in joined {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(job_id = %job_id.as_uuid(), chunk = index, error = %e, "Chunk task aborted");
                    let error = ProviderError::Fatal(format!("chunk task aborted: {}", e));
                    self.tracker.chunk_failed(job_id, index, &error.to_string());
                    outcomes.push(ChunkOutcome {
                        index,
                        range,
                        result: Err(error),
                    });
                }
            }
        }
        outcomes.sort_by_key(|o| o.index);
        outcomes
    }
}

async fn transcribe_chunk(
    job_id: JobId,
    chunk: Chunk,
    tracker: Arc<JobTracker>,
    provider: Arc<dyn TranscriptionProvider>,
    pool: Arc<ProviderPool>,
    language: LanguageHint,
    context: String,
) -> ChunkOutcome {
    let index = chunk.index;
    let range = chunk.range;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        tracker.chunk_in_flight(job_id, index);

        let Some(permit) = pool.acquire().await else {
            let error = ProviderError::Fatal("provider pool closed".to_string());
            tracker.chunk_failed(job_id, index, &error.to_string());
            return ChunkOutcome {
                index,
                range,
                result: Err(error),
            };
        };

        let call = provider.transcribe(&chunk.payload, &language, &context);
        let result = match tokio::time::timeout(pool.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Transient(format!(
                "provider call timed out after {}s",
                pool.request_timeout.as_secs()
            ))),
        };
        // Release the pool slot before any backoff sleep so waiting chunks
        // are not starved by a retrying one.
        drop(permit);

        match result {
            Ok(text) => {
                tracker.chunk_succeeded(job_id, index, &text);
                return ChunkOutcome {
                    index,
                    range,
                    result: Ok(text),
                };
            }
            Err(error) => {
                let budget = pool.attempt_budget(&error);
                if error.is_retryable() && attempt < budget {
                    let delay = pool.backoff.delay_for_attempt(attempt, jitter_unit());
                    tracker.chunk_retrying(job_id, index, attempt);
                    tracing::warn!(
                        job_id = %job_id.as_uuid(),
                        chunk = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying chunk after provider error"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                tracker.chunk_failed(job_id, index, &error.to_string());
                return ChunkOutcome {
                    index,
                    range,
                    result: Err(error),
                };
            }
        }
    }
}
