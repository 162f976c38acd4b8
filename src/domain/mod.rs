mod audio;
mod chunk;
mod job;
mod job_state;
mod language;
mod provider_choice;
mod transcript;

pub use audio::NormalizedAudio;
pub use chunk::{Chunk, ChunkId, ChunkStatus, TimeRange};
pub use job::{Job, JobId, ProgressEntry};
pub use job_state::JobState;
pub use language::{LanguageHint, SUPPORTED_LANGUAGE_CODES};
pub use provider_choice::ProviderChoice;
pub use transcript::TranscriptRecord;
