use nexttrip_core::repository::BackendError;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Error bodies come back as `{message}` or `{error}`, sometimes both.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ClientError {
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        ClientError::Status { status, message }
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, .. } if status == StatusCode::UNAUTHORIZED => BackendError::Auth,
            ClientError::Status { status, message } => BackendError::BusinessRule {
                status: status.as_u16(),
                message,
            },
            ClientError::Transport(e) if e.is_decode() => BackendError::Protocol(e.to_string()),
            ClientError::Transport(e) => BackendError::Network(e.to_string()),
            ClientError::InvalidUrl(url) => BackendError::Protocol(format!("invalid URL {}", url)),
        }
    }
}
