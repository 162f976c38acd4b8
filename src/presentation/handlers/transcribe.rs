use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;

use crate::application::services::{SubmitError, SubmitRequest};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut data: Option<Bytes> = None;
    let mut filename = String::new();
    let mut language_code = state.settings.defaults.language.clone();
    let mut api_choice = state.settings.defaults.api_choice.clone();
    let mut context_prompt = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Failed to read multipart: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        match field.name() {
            Some("audio_file") => {
                filename = field.file_name().unwrap_or("unknown").to_string();
                match field.bytes().await {
                    Ok(bytes) => data = Some(bytes),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read file bytes");
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("Failed to read file: {}", e),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            Some("language_code") => {
                if let Ok(value) = field.text().await {
                    language_code = value;
                }
            }
            Some("api_choice") => {
                if let Ok(value) = field.text().await {
                    api_choice = value;
                }
            }
            Some("context_prompt") => {
                if let Ok(value) = field.text().await {
                    context_prompt = value;
                }
            }
            _ => {}
        }
    }

    let Some(data) = data else {
        tracing::warn!("Transcribe request with no audio file");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No audio file provided".to_string(),
            }),
        )
            .into_response();
    };

    tracing::debug!(
        filename = %filename,
        bytes = data.len(),
        api_choice = %api_choice,
        "Processing transcription upload"
    );

    let request = SubmitRequest {
        data: data.to_vec(),
        filename,
        language_code,
        api_choice,
        context_prompt,
    };

    match state.transcription_service.submit(request) {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(TranscribeResponse {
                job_id: job_id.as_uuid().to_string(),
                message: "Transcription started".to_string(),
            }),
        )
            .into_response(),
        Err(SubmitError::Validation(message)) => {
            tracing::warn!(error = %message, "Rejected transcription request");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
        Err(SubmitError::TooManyJobs) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many concurrent transcription jobs. Please try again later."
                    .to_string(),
            }),
        )
            .into_response(),
    }
}
