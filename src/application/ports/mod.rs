mod media_normalizer;
mod segmenter;
mod transcript_store;
mod transcription_provider;

pub use media_normalizer::{MediaNormalizer, NormalizeError};
pub use segmenter::{SegmentError, Segmenter};
pub use transcript_store::{StoreError, TranscriptStore};
pub use transcription_provider::{ProviderError, TranscriptionProvider};
