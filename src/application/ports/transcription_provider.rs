use async_trait::async_trait;

use crate::domain::LanguageHint;

/// One speech-to-text backend. Implementations shape the upstream request
/// and classify every failure; they know nothing about chunking or
/// concurrency and are called once per chunk per attempt.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Maximum length of the free-text context hint in characters.
    /// `None` means the backend has no hint parameter and the hint is
    /// silently dropped.
    fn context_limit(&self) -> Option<usize>;

    async fn transcribe(
        &self,
        audio: &[u8],
        language: &LanguageHint,
        context: &str,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Rate limit, timeout, or server error. Safe to retry.
    #[error("transient provider error: {0}")]
    Transient(String),
    /// Bad credentials, invalid request, unsupported format. Never retried.
    #[error("fatal provider error: {0}")]
    Fatal(String),
    /// Unclassifiable failure. Retried on a reduced budget.
    #[error("unclassified provider error: {0}")]
    Unknown(String),
    /// Local parameter violation detected before anything was sent.
    #[error("invalid request parameters: {0}")]
    Validation(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transient(_) | ProviderError::Unknown(_))
    }
}
