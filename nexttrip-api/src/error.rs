use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nexttrip_core::repository::BackendError;
use nexttrip_wizard::WizardError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError { message: String, field: Option<&'static str> },
    NotFoundError(String),
    ConflictError(String),
    /// The backend understood the booking and refused it.
    RejectedError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    fn from_wizard(err: WizardError) -> Self {
        match err {
            WizardError::Validation(v) => AppError::ValidationError {
                message: v.to_string(),
                field: v.field(),
            },
            WizardError::NoFlightSelected => AppError::NotFoundError(err.to_string()),
            WizardError::Submission(e) => Self::from_backend(e),
            WizardError::InvalidTransition { .. }
            | WizardError::InvalidReopen { .. }
            | WizardError::NotReady(_)
            | WizardError::SessionClosed
            | WizardError::SubmissionInProgress => AppError::ConflictError(err.to_string()),
        }
    }

    fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::Auth => AppError::AuthenticationError(err.user_message()),
            BackendError::BusinessRule { status: 404, message } => AppError::NotFoundError(message),
            BackendError::BusinessRule { status, message } if status < 500 => AppError::RejectedError(message),
            BackendError::BusinessRule { .. } | BackendError::Network(_) | BackendError::Protocol(_) => {
                tracing::warn!("Backend failure: {}", err);
                AppError::UpstreamError(err.user_message())
            }
        }
    }

    /// Errors that arrived through `?` are matched back to their domain type.
    fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<WizardError>() {
            Ok(e) => return Self::from_wizard(e),
            Err(err) => err,
        };
        match err.downcast::<BackendError>() {
            Ok(e) => Self::from_backend(e),
            Err(err) => AppError::Anyhow(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let this = match self {
            AppError::Anyhow(err) => AppError::classify(err),
            other => other,
        };

        let (status, error_message, field) = match this {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError { message, field } => (StatusCode::BAD_REQUEST, message, field),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::RejectedError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            AppError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
        };

        let body = match field {
            Some(field) => Json(json!({ "error": error_message, "field": field })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexttrip_core::ValidationError;
    use nexttrip_wizard::{WizardState, WizardStep};

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(status_of(WizardError::NoFlightSelected), StatusCode::NOT_FOUND);
        assert_eq!(status_of(WizardError::SubmissionInProgress), StatusCode::CONFLICT);
        assert_eq!(
            status_of(WizardError::InvalidTransition { state: WizardState::Selected, step: WizardStep::Payment }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(WizardError::Validation(ValidationError::MissingField("email"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(WizardError::Submission(BackendError::BusinessRule {
                status: 400,
                message: "Not enough seats available".into()
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(BackendError::Auth), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(BackendError::Network("refused".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
