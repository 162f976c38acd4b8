use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{JobId, TranscriptRecord};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscriptionResponse {
    pub id: String,
    pub filename: String,
    pub detected_language: String,
    pub transcription_text: String,
    pub api_used: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<TranscriptRecord> for TranscriptionResponse {
    fn from(record: TranscriptRecord) -> Self {
        Self {
            id: record.id.as_uuid().to_string(),
            filename: record.filename,
            detected_language: record.language,
            transcription_text: record.text,
            api_used: record.provider,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_transcriptions_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.transcript_store.list().await {
        Ok(records) => {
            let response: Vec<TranscriptionResponse> =
                records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list transcriptions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to list transcriptions: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_transcription_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid transcription ID: {}", id),
                }),
            )
                .into_response();
        }
    };

    match state.transcript_store.delete(JobId::from_uuid(uuid)).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Transcription deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete transcription");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to delete transcription: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn clear_transcriptions_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.transcript_store.clear().await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "All transcriptions cleared".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to clear transcriptions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to clear transcriptions: {}", e),
                }),
            )
                .into_response()
        }
    }
}
