mod aggregator;
mod backoff;
mod dispatcher;
mod job_tracker;
mod provider_registry;
mod transcription_service;

pub use aggregator::Aggregator;
pub use backoff::{jitter_unit, BackoffPolicy};
pub use dispatcher::{ChunkOutcome, Dispatcher, ProviderPool};
pub use job_tracker::{JobSnapshot, JobTracker, TrackerError};
pub use provider_registry::ProviderRegistry;
pub use transcription_service::{
    SubmitError, SubmitRequest, TranscriptionService, ALLOWED_EXTENSIONS,
};
