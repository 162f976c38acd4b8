use reqwest::StatusCode;

use crate::application::ports::ProviderError;

/// Maps an upstream HTTP status to the retry taxonomy. Rate limits,
/// timeouts and server errors are worth retrying; client-side rejections
/// never are. Anything else stays `Unknown` and gets a reduced budget.
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = format!("status {}: {}", status, body.trim());
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        ProviderError::Transient(message)
    } else if matches!(status.as_u16(), 400 | 401 | 403 | 404 | 413 | 415 | 422) {
        ProviderError::Fatal(message)
    } else {
        ProviderError::Unknown(message)
    }
}

pub fn classify_request_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::Transient(format!("request: {}", error))
    } else {
        ProviderError::Unknown(format!("request: {}", error))
    }
}

/// Local guard on the free-text hint; a violation never reaches the wire.
pub fn ensure_context_within(
    limit: usize,
    context: &str,
    provider: &str,
) -> Result<(), ProviderError> {
    if context.chars().count() > limit {
        return Err(ProviderError::Validation(format!(
            "context hint exceeds {} characters for {}",
            limit, provider
        )));
    }
    Ok(())
}
