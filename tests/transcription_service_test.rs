use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use skrivari::application::ports::{
    MediaNormalizer, NormalizeError, ProviderError, SegmentError, Segmenter, TranscriptStore,
    TranscriptionProvider,
};
use skrivari::application::services::{
    BackoffPolicy, JobTracker, ProviderPool, ProviderRegistry, SubmitError, SubmitRequest,
    TranscriptionService,
};
use skrivari::domain::{
    Chunk, JobState, LanguageHint, NormalizedAudio, ProviderChoice, TimeRange,
};
use skrivari::infrastructure::persistence::InMemoryTranscriptStore;

struct FixedNormalizer {
    duration_ms: u64,
}

#[async_trait]
impl MediaNormalizer for FixedNormalizer {
    async fn normalize(
        &self,
        _data: &[u8],
        _container: &str,
    ) -> Result<NormalizedAudio, NormalizeError> {
        let samples = vec![0.5f32; (self.duration_ms * 16) as usize];
        Ok(NormalizedAudio::new(samples, 16_000))
    }
}

struct FailingNormalizer;

#[async_trait]
impl MediaNormalizer for FailingNormalizer {
    async fn normalize(
        &self,
        _data: &[u8],
        _container: &str,
    ) -> Result<NormalizedAudio, NormalizeError> {
        Err(NormalizeError::Decode("probe: unsupported format".into()))
    }
}

/// Splits the stream into `count` equal chunks, tagging each payload with
/// its index so the scripted provider can tell them apart.
struct FixedSegmenter {
    count: usize,
}

impl Segmenter for FixedSegmenter {
    fn segment(&self, audio: &NormalizedAudio) -> Result<Vec<Chunk>, SegmentError> {
        if audio.is_empty() {
            return Err(SegmentError::EmptyMedia);
        }
        let total_ms = audio.duration_ms();
        let step = total_ms / self.count as u64;
        Ok((0..self.count)
            .map(|i| {
                let start = i as u64 * step;
                let end = if i == self.count - 1 {
                    total_ms
                } else {
                    (i as u64 + 1) * step
                };
                Chunk::new(i, TimeRange::new(start, end), vec![i as u8])
            })
            .collect())
    }
}

struct ScriptedProvider {
    calls: AtomicUsize,
    fatal_marker: Option<u8>,
    transient_failures_for_marker: Option<(u8, usize)>,
}

impl ScriptedProvider {
    fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fatal_marker: None,
            transient_failures_for_marker: None,
        }
    }

    fn fatal_on(marker: u8) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fatal_marker: Some(marker),
            transient_failures_for_marker: None,
        }
    }

    fn flaky_on(marker: u8, failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fatal_marker: None,
            transient_failures_for_marker: Some((marker, failures)),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn context_limit(&self) -> Option<usize> {
        Some(100)
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        _language: &LanguageHint,
        _context: &str,
    ) -> Result<String, ProviderError> {
        let marker = audio.first().copied().unwrap_or(0);
        if self.fatal_marker == Some(marker) {
            return Err(ProviderError::Fatal("status 401: bad credentials".into()));
        }
        if let Some((flaky, failures)) = self.transient_failures_for_marker {
            if marker == flaky {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call < failures {
                    return Err(ProviderError::Transient("status 429: rate limited".into()));
                }
            }
        }
        Ok(format!("part{}", marker))
    }
}

fn registry_with(provider: Arc<dyn TranscriptionProvider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    let pool = Arc::new(ProviderPool::new(
        4,
        3,
        BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(100)),
        Duration::from_secs(5),
    ));
    registry.register(ProviderChoice::Gpt4o, provider, pool);
    registry
}

fn service_with(
    normalizer: Arc<dyn MediaNormalizer>,
    segmenter: Arc<dyn Segmenter>,
    provider: Arc<dyn TranscriptionProvider>,
    store: Arc<InMemoryTranscriptStore>,
    max_active_jobs: usize,
) -> Arc<TranscriptionService> {
    Arc::new(TranscriptionService::new(
        Arc::new(JobTracker::new()),
        normalizer,
        segmenter,
        registry_with(provider),
        store,
        max_active_jobs,
    ))
}

fn request(filename: &str, context: &str) -> SubmitRequest {
    SubmitRequest {
        data: vec![1, 2, 3, 4],
        filename: filename.to_string(),
        language_code: "auto".to_string(),
        api_choice: "gpt4o".to_string(),
        context_prompt: context.to_string(),
    }
}

async fn wait_for_terminal(
    service: &Arc<TranscriptionService>,
    id: skrivari::domain::JobId,
) -> skrivari::application::services::JobSnapshot {
    for _ in 0..500 {
        let snapshot = service.progress(id).expect("job must exist");
        if snapshot.state.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job did not reach a terminal state");
}

#[tokio::test]
async fn given_valid_submission_when_all_chunks_succeed_then_job_finishes_with_ordered_transcript()
{
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 5000 }),
        Arc::new(FixedSegmenter { count: 3 }),
        Arc::new(ScriptedProvider::succeeding()),
        store.clone(),
        10,
    );

    let id = service.submit(request("meeting.mp3", "")).unwrap();
    let snapshot = wait_for_terminal(&service, id).await;

    assert_eq!(snapshot.state, JobState::Finished);
    assert_eq!(snapshot.transcript.as_deref(), Some("part0 part1 part2"));
    assert!(snapshot.error_message.is_none());

    for _ in 0..100 {
        if !store.list().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "meeting.mp3");
    assert_eq!(records[0].provider, "gpt4o");
    assert_eq!(records[0].language, "en");
    assert_eq!(records[0].text, "part0 part1 part2");
}

#[tokio::test]
async fn given_one_fatal_chunk_among_five_when_job_ends_then_error_names_the_chunk_and_no_transcript_leaks(
) {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 5000 }),
        Arc::new(FixedSegmenter { count: 5 }),
        Arc::new(ScriptedProvider::fatal_on(2)),
        store.clone(),
        10,
    );

    let id = service.submit(request("meeting.mp3", "")).unwrap();
    let snapshot = wait_for_terminal(&service, id).await;

    assert_eq!(snapshot.state, JobState::Error);
    assert!(snapshot.transcript.is_none(), "no partial transcript");
    let message = snapshot.error_message.unwrap();
    assert!(message.contains("chunk 3/5"), "message was: {}", message);
    assert!(message.contains("bad credentials"), "message was: {}", message);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn given_flaky_chunk_when_retries_recover_then_job_finishes_and_log_shows_retries() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 5000 }),
        Arc::new(FixedSegmenter { count: 3 }),
        Arc::new(ScriptedProvider::flaky_on(1, 2)),
        store.clone(),
        10,
    );

    let id = service.submit(request("meeting.mp3", "")).unwrap();
    let snapshot = wait_for_terminal(&service, id).await;

    assert_eq!(snapshot.state, JobState::Finished);
    assert_eq!(snapshot.transcript.as_deref(), Some("part0 part1 part2"));
    let retries = snapshot
        .progress
        .iter()
        .filter(|e| e.message.contains("chunk 2/3 retrying after transient error"))
        .count();
    assert_eq!(retries, 2);
}

#[tokio::test]
async fn given_undecodable_media_when_job_runs_then_it_fails_before_any_chunk_is_dispatched() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FailingNormalizer),
        Arc::new(FixedSegmenter { count: 3 }),
        Arc::new(ScriptedProvider::succeeding()),
        store.clone(),
        10,
    );

    let id = service.submit(request("meeting.mp3", "")).unwrap();
    let snapshot = wait_for_terminal(&service, id).await;

    assert_eq!(snapshot.state, JobState::Error);
    assert_eq!(snapshot.chunks_total, 0);
    let message = snapshot.error_message.unwrap();
    assert!(message.contains("audio decoding failed"), "{}", message);
}

#[tokio::test]
async fn given_unsupported_file_type_when_submitted_then_validation_fails_synchronously() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 1000 }),
        Arc::new(FixedSegmenter { count: 1 }),
        Arc::new(ScriptedProvider::succeeding()),
        store,
        10,
    );

    let result = service.submit(request("document.pdf", ""));

    assert!(matches!(result, Err(SubmitError::Validation(_))));
}

#[tokio::test]
async fn given_oversized_context_prompt_when_submitted_then_validation_fails_synchronously() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 1000 }),
        Arc::new(FixedSegmenter { count: 1 }),
        Arc::new(ScriptedProvider::succeeding()),
        store,
        10,
    );

    let long_context = "x".repeat(500);
    let result = service.submit(request("meeting.mp3", &long_context));

    assert!(matches!(result, Err(SubmitError::Validation(_))));
}

#[tokio::test]
async fn given_unknown_provider_or_language_when_submitted_then_validation_fails() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 1000 }),
        Arc::new(FixedSegmenter { count: 1 }),
        Arc::new(ScriptedProvider::succeeding()),
        store,
        10,
    );

    let mut bad_provider = request("meeting.mp3", "");
    bad_provider.api_choice = "watson".to_string();
    assert!(matches!(
        service.submit(bad_provider),
        Err(SubmitError::Validation(_))
    ));

    let mut bad_language = request("meeting.mp3", "");
    bad_language.language_code = "tlh".to_string();
    assert!(matches!(
        service.submit(bad_language),
        Err(SubmitError::Validation(_))
    ));

    // whisper is a known choice but was never registered here
    let mut unregistered = request("meeting.mp3", "");
    unregistered.api_choice = "whisper".to_string();
    assert!(matches!(
        service.submit(unregistered),
        Err(SubmitError::Validation(_))
    ));
}

#[tokio::test]
async fn given_active_job_ceiling_reached_when_submitted_then_request_is_rejected() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 1000 }),
        Arc::new(FixedSegmenter { count: 1 }),
        Arc::new(ScriptedProvider::succeeding()),
        store,
        0,
    );

    let result = service.submit(request("meeting.mp3", ""));

    assert!(matches!(result, Err(SubmitError::TooManyJobs)));
}

#[tokio::test]
async fn given_requested_language_when_job_finishes_then_record_keeps_that_language() {
    let store = Arc::new(InMemoryTranscriptStore::new());
    let service = service_with(
        Arc::new(FixedNormalizer { duration_ms: 1000 }),
        Arc::new(FixedSegmenter { count: 1 }),
        Arc::new(ScriptedProvider::succeeding()),
        store.clone(),
        10,
    );

    let mut req = request("interview.wav", "");
    req.language_code = "nl".to_string();
    let id = service.submit(req).unwrap();
    let snapshot = wait_for_terminal(&service, id).await;

    assert_eq!(snapshot.state, JobState::Finished);
    for _ in 0..100 {
        if !store.list().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let records = store.list().await.unwrap();
    assert_eq!(records[0].language, "nl");
}
