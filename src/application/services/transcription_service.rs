use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;

use crate::application::ports::{MediaNormalizer, Segmenter, TranscriptStore};
use crate::domain::{Job, JobId, JobState, LanguageHint, ProviderChoice, TranscriptRecord};

use super::aggregator::Aggregator;
use super::dispatcher::Dispatcher;
use super::job_tracker::{JobSnapshot, JobTracker};
use super::provider_registry::ProviderRegistry;

/// Container extensions accepted at submission.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "ogg", "webm"];

#[derive(Debug)]
pub struct SubmitRequest {
    pub data: Vec<u8>,
    pub filename: String,
    pub language_code: String,
    pub api_choice: String,
    pub context_prompt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),
    #[error("too many concurrent transcription jobs")]
    TooManyJobs,
}

/// The engine facade: synchronous validation at submission, then an
/// asynchronous pipeline (extract, segment, dispatch, aggregate) driven
/// through the job tracker, polled via `progress`.
pub struct TranscriptionService {
    tracker: Arc<JobTracker>,
    normalizer: Arc<dyn MediaNormalizer>,
    segmenter: Arc<dyn Segmenter>,
    providers: ProviderRegistry,
    dispatcher: Dispatcher,
    aggregator: Aggregator,
    store: Arc<dyn TranscriptStore>,
    max_active_jobs: usize,
}

impl TranscriptionService {
    pub fn new(
        tracker: Arc<JobTracker>,
        normalizer: Arc<dyn MediaNormalizer>,
        segmenter: Arc<dyn Segmenter>,
        providers: ProviderRegistry,
        store: Arc<dyn TranscriptStore>,
        max_active_jobs: usize,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&tracker));
        Self {
            tracker,
            normalizer,
            segmenter,
            providers,
            dispatcher,
            aggregator: Aggregator::new(),
            store,
            max_active_jobs,
        }
    }

    /// Validates the request, creates the job, and spawns the pipeline.
    /// Returns as soon as the job is queued; all further observation goes
    /// through `progress`.
    pub fn submit(self: &Arc<Self>, request: SubmitRequest) -> Result<JobId, SubmitError> {
        let container = container_extension(&request.filename)?;
        let language = LanguageHint::parse(&request.language_code)
            .map_err(SubmitError::Validation)?;
        let choice = ProviderChoice::from_str(&request.api_choice)
            .map_err(SubmitError::Validation)?;
        let (provider, _) = self
            .providers
            .get(choice)
            .ok_or_else(|| SubmitError::Validation(format!("Provider not configured: {}", choice)))?;

        if request.data.is_empty() {
            return Err(SubmitError::Validation("Empty audio file".to_string()));
        }
        if let Some(limit) = provider.context_limit() {
            if request.context_prompt.chars().count() > limit {
                return Err(SubmitError::Validation(format!(
                    "Context prompt exceeds {} characters for {}",
                    limit, choice
                )));
            }
        }
        if self.tracker.active_jobs() >= self.max_active_jobs {
            return Err(SubmitError::TooManyJobs);
        }

        let job = Job::new(request.filename.clone(), language.clone(), choice);
        let job_id = self.tracker.create(job);
        self.tracker.append_progress(job_id, "Transcription started.");
        self.tracker.append_progress(
            job_id,
            format!("Language: {}, provider: {}", language, choice),
        );

        let service = Arc::clone(self);
        let span = tracing::info_span!(
            "transcription_job",
            job_id = %job_id.as_uuid(),
            filename = %request.filename,
            provider = %choice,
        );
        tokio::spawn(
            async move {
                service
                    .run_job(job_id, request.data, container, language, choice, request.context_prompt)
                    .await;
            }
            .instrument(span),
        );

        Ok(job_id)
    }

    /// Idempotent poll. `None` when the job id is unknown.
    pub fn progress(&self, id: JobId) -> Option<JobSnapshot> {
        self.tracker.snapshot(id)
    }

    async fn run_job(
        &self,
        job_id: JobId,
        data: Vec<u8>,
        container: String,
        language: LanguageHint,
        choice: ProviderChoice,
        context: String,
    ) {
        if let Err(message) = self
            .run_pipeline(job_id, data, container, language, choice, context)
            .await
        {
            if let Err(e) = self.tracker.fail(job_id, &message) {
                tracing::error!(job_id = %job_id.as_uuid(), error = %e, "Could not record job failure");
            }
        }
    }

    async fn run_pipeline(
        &self,
        job_id: JobId,
        data: Vec<u8>,
        container: String,
        language: LanguageHint,
        choice: ProviderChoice,
        context: String,
    ) -> Result<(), String> {
        self.tracker
            .transition(job_id, JobState::Extracting)
            .map_err(|e| e.to_string())?;
        self.tracker
            .append_progress(job_id, "Extracting audio track.");

        let audio = self
            .normalizer
            .normalize(&data, &container)
            .await
            .map_err(|e| e.to_string())?;
        self.tracker.append_progress(
            job_id,
            format!("Decoded {} ms of audio.", audio.duration_ms()),
        );

        self.tracker
            .transition(job_id, JobState::Segmenting)
            .map_err(|e| e.to_string())?;
        let chunks = self.segmenter.segment(&audio).map_err(|e| e.to_string())?;
        self.tracker
            .register_chunks(job_id, &chunks)
            .map_err(|e| e.to_string())?;
        self.tracker.append_progress(
            job_id,
            format!("Split into {} chunk(s) on silence boundaries.", chunks.len()),
        );

        self.tracker
            .transition(job_id, JobState::Transcribing)
            .map_err(|e| e.to_string())?;
        let (provider, pool) = self
            .providers
            .get(choice)
            .ok_or_else(|| format!("Provider not configured: {}", choice))?;
        let total = chunks.len();
        let outcomes = self
            .dispatcher
            .dispatch(job_id, chunks, provider, pool, language.clone(), context)
            .await;

        // All chunks are terminal here. Any permanent chunk failure fails
        // the whole job; successful chunk text is discarded rather than
        // surfaced as a partial transcript.
        if let Some(failed) = outcomes.iter().find(|o| o.result.is_err()) {
            let reason = failed
                .result
                .as_ref()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(format!(
                "chunk {}/{} failed permanently: {}",
                failed.index + 1,
                total,
                reason
            ));
        }

        self.tracker
            .transition(job_id, JobState::Aggregating)
            .map_err(|e| e.to_string())?;
        self.tracker.append_progress(job_id, "Assembling transcript.");
        let texts: Vec<&str> = outcomes
            .iter()
            .map(|o| o.result.as_deref().unwrap_or_default())
            .collect();
        let transcript = self.aggregator.assemble(&texts);

        let filename = self
            .tracker
            .snapshot(job_id)
            .map(|s| s.filename)
            .unwrap_or_default();
        self.tracker
            .finish(job_id, transcript.clone())
            .map_err(|e| e.to_string())?;

        let record = TranscriptRecord {
            id: job_id,
            filename,
            language: language.resolved().to_string(),
            provider: choice.to_string(),
            text: transcript,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&record).await {
            // The job is already finished; history storage is the external
            // collaborator's concern and must not un-finish it.
            tracing::warn!(job_id = %job_id.as_uuid(), error = %e, "Failed to persist transcript record");
        }

        Ok(())
    }
}

fn container_extension(filename: &str) -> Result<String, SubmitError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(SubmitError::Validation(format!(
            "File type not allowed: {}",
            filename
        )))
    }
}
