use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    clear_transcriptions_handler, delete_transcription_handler, health_handler,
    list_transcriptions_handler, progress_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let max_upload_bytes = state.settings.server.max_upload_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/transcribe", post(transcribe_handler))
        .route("/api/progress/{job_id}", get(progress_handler))
        .route(
            "/api/transcriptions",
            get(list_transcriptions_handler).delete(clear_transcriptions_handler),
        )
        .route(
            "/api/transcriptions/{id}",
            delete(delete_transcription_handler),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
