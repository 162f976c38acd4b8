use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{ProviderError, TranscriptionProvider};
use crate::domain::LanguageHint;

use super::classify::{classify_request_error, classify_status, ensure_context_within};

pub struct OpenAiGpt4oProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    context_limit: usize,
}

impl OpenAiGpt4oProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        context_limit: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-transcribe".to_string()),
            context_limit,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAiGpt4oProvider {
    fn name(&self) -> &'static str {
        "gpt4o"
    }

    fn context_limit(&self) -> Option<usize> {
        Some(self.context_limit)
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        language: &LanguageHint,
        context: &str,
    ) -> Result<String, ProviderError> {
        ensure_context_within(self.context_limit, context, self.name())?;

        let url = format!("{}/audio/transcriptions", self.base_url);
        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::Validation(format!("mime: {}", e)))?;

        // The transcribe endpoint for this model takes no language
        // parameter; a requested language only shapes the prompt.
        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);
        if !context.is_empty() {
            form = form.text("prompt", context.to_string());
        }

        tracing::debug!(
            model = %self.model,
            bytes = audio.len(),
            language = %language,
            "Sending chunk to OpenAI transcribe endpoint"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
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

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Unknown(format!("body: {}", e)))?;
        Ok(text.trim().to_string())
    }
}
