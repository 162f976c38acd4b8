use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ProviderError, TranscriptionProvider};
use crate::domain::LanguageHint;

use super::classify::{classify_request_error, classify_status};

pub struct AssemblyAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
}

impl AssemblyAiProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.assemblyai.com".to_string()),
            poll_interval: Duration::from_secs(2),
        }
    }

    async fn upload(&self, audio: &[u8]) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unknown(format!("parse upload response: {}", e)))?;
        Ok(uploaded.upload_url)
    }

    async fn create_transcript(
        &self,
        audio_url: &str,
        language: &LanguageHint,
    ) -> Result<String, ProviderError> {
        let request = TranscriptRequest {
            audio_url: audio_url.to_string(),
            language_code: language.code().map(str::to_string),
            language_detection: language.code().is_none().then_some(true),
        };

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let created: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unknown(format!("parse transcript response: {}", e)))?;
        Ok(created.id)
    }

    async fn poll_transcript(&self, id: &str) -> Result<TranscriptResponse, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v2/transcript/{}", self.base_url, id))
            .header("authorization", &self.api_key)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Unknown(format!("parse transcript response: {}", e)))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest {
    audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_detection: Option<bool>,
}

#[derive(Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiProvider {
    fn name(&self) -> &'static str {
        "assemblyai"
    }

    /// The transcript API has no free-text hint parameter; the hint is
    /// dropped rather than rejected.
    fn context_limit(&self) -> Option<usize> {
        None
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        language: &LanguageHint,
        _context: &str,
    ) -> Result<String, ProviderError> {
        let audio_url = self.upload(audio).await?;
        let transcript_id = self.create_transcript(&audio_url, language).await?;

        tracing::debug!(transcript_id = %transcript_id, "Polling AssemblyAI transcript");

        // The dispatcher bounds the whole call with its per-attempt
        // timeout, so the poll loop needs no deadline of its own.
        loop {
            let transcript = self.poll_transcript(&transcript_id).await?;
            match transcript.status.as_str() {
                "completed" => {
                    return Ok(transcript.text.unwrap_or_default().trim().to_string());
                }
                "error" => {
                    return Err(ProviderError::Fatal(format!(
                        "AssemblyAI transcription failed: {}",
                        transcript.error.unwrap_or_else(|| "unknown error".to_string())
                    )));
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}
