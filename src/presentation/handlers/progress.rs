use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::JobSnapshot;
use crate::domain::JobId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ProgressResponse {
    pub id: String,
    pub state: String,
    pub finished: bool,
    pub filename: String,
    pub provider: String,
    pub progress: Vec<String>,
    pub chunks_total: usize,
    pub chunks_done: usize,
    pub transcript: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<JobSnapshot> for ProgressResponse {
    fn from(snapshot: JobSnapshot) -> Self {
        Self {
            id: snapshot.id.as_uuid().to_string(),
            state: snapshot.state.as_str().to_string(),
            finished: snapshot.state.is_terminal(),
            filename: snapshot.filename,
            provider: snapshot.provider.to_string(),
            progress: snapshot
                .progress
                .into_iter()
                .map(|entry| entry.message)
                .collect(),
            chunks_total: snapshot.chunks_total,
            chunks_done: snapshot.chunks_done,
            transcript: snapshot.transcript,
            error: snapshot.error_message,
            created_at: snapshot.created_at.to_rfc3339(),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn progress_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .transcription_service
        .progress(JobId::from_uuid(uuid))
    {
        Some(snapshot) => (StatusCode::OK, Json(ProgressResponse::from(snapshot))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Job not found: {}", job_id),
            }),
        )
            .into_response(),
    }
}
