use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use skrivari::application::ports::{ProviderError, TranscriptionProvider};
use skrivari::application::services::{BackoffPolicy, Dispatcher, JobTracker, ProviderPool};
use skrivari::domain::{
    Chunk, Job, JobId, JobState, LanguageHint, ProviderChoice, TimeRange,
};

/// Scripted backend: per-chunk behavior keyed by the first payload byte.
struct ScriptedProvider {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Number of transient failures served before succeeding.
    transient_failures: usize,
    /// Chunk marker (first payload byte) that always fails fatally.
    fatal_marker: Option<u8>,
    /// When set, every call fails with this error.
    always_fail: Option<ProviderError>,
}

impl ScriptedProvider {
    fn succeeding() -> Self {
        Self::new(0, None, None)
    }

    fn new(
        transient_failures: usize,
        fatal_marker: Option<u8>,
        always_fail: Option<ProviderError>,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            transient_failures,
            fatal_marker,
            always_fail,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn context_limit(&self) -> Option<usize> {
        Some(1000)
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        _language: &LanguageHint,
        _context: &str,
    ) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = &self.always_fail {
            return Err(error.clone());
        }
        let marker = audio.first().copied().unwrap_or(0);
        if self.fatal_marker == Some(marker) {
            return Err(ProviderError::Fatal("status 401: bad credentials".into()));
        }
        if call < self.transient_failures {
            return Err(ProviderError::Transient("status 429: rate limited".into()));
        }
        Ok(format!("text-{}", marker))
    }
}

fn make_chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|i| {
            Chunk::new(
                i,
                TimeRange::new(i as u64 * 1000, (i as u64 + 1) * 1000),
                vec![i as u8],
            )
        })
        .collect()
}

fn transcribing_job(tracker: &JobTracker, chunks: &[Chunk]) -> JobId {
    let job = Job::new(
        "lecture.wav".to_string(),
        LanguageHint::Auto,
        ProviderChoice::Whisper,
    );
    let id = tracker.create(job);
    tracker.transition(id, JobState::Extracting).unwrap();
    tracker.transition(id, JobState::Segmenting).unwrap();
    tracker.register_chunks(id, chunks).unwrap();
    tracker.transition(id, JobState::Transcribing).unwrap();
    id
}

fn pool(concurrency: usize, max_attempts: u32) -> Arc<ProviderPool> {
    Arc::new(ProviderPool::new(
        concurrency,
        max_attempts,
        BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(2)),
        Duration::from_secs(30),
    ))
}

#[tokio::test(start_paused = true)]
async fn given_twenty_chunks_and_ceiling_of_three_when_dispatched_then_in_flight_never_exceeds_three(
) {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::succeeding());
    let chunks = make_chunks(20);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider.clone(),
            pool(3, 3),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert_eq!(outcomes.len(), 20);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
    assert!(
        provider.max_in_flight() <= 3,
        "observed {} concurrent calls",
        provider.max_in_flight()
    );
}

#[tokio::test(start_paused = true)]
async fn given_completion_out_of_order_when_dispatched_then_outcomes_come_back_in_index_order() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::succeeding());
    let chunks = make_chunks(7);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider,
            pool(2, 3),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, (0..7).collect::<Vec<_>>());
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.result.as_deref().unwrap(), format!("text-{}", i));
    }
}

#[tokio::test(start_paused = true)]
async fn given_two_transient_failures_when_dispatched_then_third_attempt_succeeds_with_retry_log() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::new(2, None, None));
    let chunks = make_chunks(1);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider.clone(),
            pool(2, 3),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result.as_deref().unwrap(), "text-0");
    assert_eq!(provider.calls(), 3);

    let snapshot = tracker.snapshot(job_id).unwrap();
    let retries = snapshot
        .progress
        .iter()
        .filter(|e| e.message.contains("chunk 1/1 retrying after transient error"))
        .count();
    assert_eq!(retries, 2);
}

#[tokio::test(start_paused = true)]
async fn given_persistent_transient_errors_when_dispatched_then_retries_stop_at_the_ceiling() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::new(
        usize::MAX,
        None,
        Some(ProviderError::Transient("status 503: unavailable".into())),
    ));
    let chunks = make_chunks(1);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider.clone(),
            pool(1, 3),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert!(matches!(
        outcomes[0].result,
        Err(ProviderError::Transient(_))
    ));
    assert_eq!(provider.calls(), 3, "attempt ceiling must hold");

    let snapshot = tracker.snapshot(job_id).unwrap();
    assert!(snapshot
        .progress
        .iter()
        .any(|e| e.message.contains("chunk 1/1 failed permanently")));
}

#[tokio::test(start_paused = true)]
async fn given_fatal_error_when_dispatched_then_chunk_is_never_retried() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::new(0, Some(0), None));
    let chunks = make_chunks(1);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider.clone(),
            pool(2, 5),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert!(matches!(outcomes[0].result, Err(ProviderError::Fatal(_))));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn given_unclassified_errors_when_dispatched_then_retry_budget_is_halved() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::new(
        usize::MAX,
        None,
        Some(ProviderError::Unknown("connection reset".into())),
    ));
    let chunks = make_chunks(1);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider.clone(),
            pool(1, 4),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert!(matches!(outcomes[0].result, Err(ProviderError::Unknown(_))));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn given_mixed_results_when_dispatched_then_every_chunk_reaches_a_terminal_status() {
    let tracker = Arc::new(JobTracker::new());
    let provider = Arc::new(ScriptedProvider::new(0, Some(2), None));
    let chunks = make_chunks(5);
    let job_id = transcribing_job(&tracker, &chunks);
    let dispatcher = Dispatcher::new(Arc::clone(&tracker));

    let outcomes = dispatcher
        .dispatch(
            job_id,
            chunks,
            provider,
            pool(2, 3),
            LanguageHint::Auto,
            String::new(),
        )
        .await;

    assert_eq!(outcomes.len(), 5);
    let snapshot = tracker.snapshot(job_id).unwrap();
    assert_eq!(snapshot.chunks_done, 5, "all chunks must be terminal");
    assert_eq!(outcomes.iter().filter(|o| o.result.is_err()).count(), 1);
    assert!(outcomes[2].result.is_err());
}
