use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{ProviderError, TranscriptionProvider};
use crate::domain::LanguageHint;

use super::classify::{classify_request_error, classify_status, ensure_context_within};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    context_limit: usize,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        context_limit: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            model: model.unwrap_or_else(|| "gemini-2.5-pro".to_string()),
            context_limit,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TranscriptionProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
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

        let mut instructions =
            vec!["Transcribe the following audio to plain text without timestamps.".to_string()];
        if !context.is_empty() {
            instructions.push(format!("Context: {}", context));
        }
        if let Some(code) = language.code() {
            instructions.push(format!(
                "The expected language is '{}'. Do not translate; transcribe verbatim.",
                code
            ));
        }

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": instructions.join("\n") },
                    {
                        "inline_data": {
                            "mime_type": "audio/wav",
                            "data": base64::engine::general_purpose::STANDARD.encode(audio),
                        }
                    }
                ]
            }]
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        tracing::debug!(model = %self.model, bytes = audio.len(), "Sending chunk to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
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

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unknown(format!("parse response: {}", e)))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() && parsed.candidates.is_empty() {
            return Err(ProviderError::Unknown(
                "response contained no candidates".to_string(),
            ));
        }

        Ok(text.trim().to_string())
    }
}
