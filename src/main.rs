use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use skrivari::application::services::{JobTracker, TranscriptionService};
use skrivari::domain::ProviderChoice;
use skrivari::infrastructure::audio::{SegmenterConfig, SilenceSegmenter, SymphoniaNormalizer};
use skrivari::infrastructure::observability::{init_tracing, TracingConfig};
use skrivari::infrastructure::persistence::InMemoryTranscriptStore;
use skrivari::infrastructure::providers::{ProviderConfig, ProviderFactory};
use skrivari::presentation::config::{ProviderSettings, SegmenterSettings};
use skrivari::presentation::{create_router, AppState, Settings};

fn provider_config(settings: &ProviderSettings) -> ProviderConfig {
    ProviderConfig {
        api_key: settings.api_key.clone(),
        base_url: settings.base_url.clone(),
        model: settings.model.clone(),
        concurrency: settings.concurrency,
        max_attempts: settings.max_attempts,
        backoff_base_ms: settings.backoff_base_ms,
        backoff_cap_ms: settings.backoff_cap_ms,
        request_timeout_secs: settings.request_timeout_secs,
        max_context_len: settings.max_context_len,
    }
}

fn segmenter_config(settings: &SegmenterSettings) -> SegmenterConfig {
    SegmenterConfig {
        max_chunk_ms: settings.max_chunk_ms,
        min_silence_ms: settings.min_silence_ms,
        silence_threshold: settings.silence_threshold,
        lookback_ms: settings.lookback_ms,
        boundary_guard_ms: settings.boundary_guard_ms,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (settings, environment) =
        Settings::from_env().map_err(|e| anyhow::anyhow!("configuration: {}", e))?;

    init_tracing(TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.enable_json,
    });

    let registry = ProviderFactory::build(&[
        (
            ProviderChoice::AssemblyAi,
            provider_config(&settings.providers.assemblyai),
        ),
        (
            ProviderChoice::Whisper,
            provider_config(&settings.providers.whisper),
        ),
        (
            ProviderChoice::Gpt4o,
            provider_config(&settings.providers.gpt4o),
        ),
        (
            ProviderChoice::Gemini,
            provider_config(&settings.providers.gemini),
        ),
    ]);

    let tracker = Arc::new(JobTracker::new());
    let store = Arc::new(InMemoryTranscriptStore::new());
    let transcription_service = Arc::new(TranscriptionService::new(
        Arc::clone(&tracker),
        Arc::new(SymphoniaNormalizer::new()),
        Arc::new(SilenceSegmenter::new(segmenter_config(&settings.segmenter))),
        registry,
        store.clone(),
        settings.jobs.max_active_jobs,
    ));

    let addr = SocketAddr::new(settings.server.host.parse()?, settings.server.port);

    let state = AppState {
        transcription_service,
        transcript_store: store,
        settings,
    };
    let router = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
