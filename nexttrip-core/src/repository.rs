use async_trait::async_trait;

use crate::search::{CitySuggestion, FlightRecord, FlightSearchQuery};

/// Failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Unreachable, timed out, or the connection dropped mid-request.
    #[error("Network error: {0}")]
    Network(String),
    /// The backend understood the request and refused it, e.g. seats sold out.
    #[error("{message}")]
    BusinessRule { status: u16, message: String },
    /// 401. The caller's session is gone; never retried locally.
    #[error("Authentication required")]
    Auth,
    /// The backend answered with something we could not decode.
    #[error("Unexpected response from backend: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Text to show next to the submit button.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => {
                "We couldn't reach the booking service. Please check your connection and try again.".to_string()
            }
            BackendError::BusinessRule { message, .. } => message.clone(),
            BackendError::Auth => "Your session has expired. Please log in again.".to_string(),
            BackendError::Protocol(_) => "Something went wrong while booking. Please try again.".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::Auth)
    }
}

/// Read access to the flight catalog that feeds the wizard.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    async fn search_flights(&self, query: &FlightSearchQuery) -> Result<Vec<FlightRecord>, BackendError>;

    async fn list_flights(&self) -> Result<Vec<FlightRecord>, BackendError>;

    async fn search_cities(&self, q: &str) -> Result<Vec<CitySuggestion>, BackendError>;
}
