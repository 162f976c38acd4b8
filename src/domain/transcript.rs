use chrono::{DateTime, Utc};

use super::JobId;

/// Finished-job record handed to the history store once a job reaches
/// `Finished`. The engine itself keeps no durable state.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    pub id: JobId,
    pub filename: String,
    pub language: String,
    pub provider: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
