use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    SessionStarted,
    StepCompleted,
    StepReopened,
    CreateBooking,
    CancelBooking,
    SessionExpired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failed,
}

/// One line of the booking audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub session_id: Option<Uuid>,
    pub subject: String,
    pub action: AuditAction,
    pub status: AuditStatus,
    pub details: String,
    pub resource_id: Option<String>,
    pub timestamp: i64,
}

impl AuditEvent {
    pub fn new(subject: impl Into<String>, action: AuditAction, status: AuditStatus, details: impl Into<String>) -> Self {
        Self {
            session_id: None,
            subject: subject.into(),
            action,
            status,
            details: details.into(),
            resource_id: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn for_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn on_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Emitted once a booking has been accepted by the backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingSubmittedEvent {
    pub session_id: Uuid,
    pub flight_id: String,
    pub subject: String,
    pub num_seats: u32,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method: String,
    pub timestamp: i64,
}
