use crate::domain::{Chunk, NormalizedAudio};

/// Cuts the normalized stream into an ordered chunk sequence whose time
/// ranges partition the stream with no gaps. Chunk payloads carry the
/// encoded audio the provider adapters send upstream.
pub trait Segmenter: Send + Sync {
    fn segment(&self, audio: &NormalizedAudio) -> Result<Vec<Chunk>, SegmentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("media stream is empty")]
    EmptyMedia,
    #[error("chunk encoding failed: {0}")]
    Encode(String),
}
