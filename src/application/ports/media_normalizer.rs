use async_trait::async_trait;

use crate::domain::NormalizedAudio;

/// Extracts and decodes the audio track of an uploaded media blob into a
/// single mono PCM stream. Decode failure is fatal to the job; there is no
/// retry path.
#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    async fn normalize(
        &self,
        data: &[u8],
        container: &str,
    ) -> Result<NormalizedAudio, NormalizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("audio decoding failed: {0}")]
    Decode(String),
    #[error("no audio track found in container")]
    NoAudioTrack,
}
