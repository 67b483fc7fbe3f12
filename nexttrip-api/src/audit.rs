use nexttrip_shared::models::events::{AuditEvent, BookingSubmittedEvent};
use tracing::{info, warn};

/// Write one audit line. Audit failures never fail the request.
pub fn record(event: &AuditEvent) {
    match serde_json::to_string(event) {
        Ok(line) => info!(target: "audit", "{}", line),
        Err(e) => warn!("Failed to serialize audit event: {}", e),
    }
}

pub fn booking_submitted(event: &BookingSubmittedEvent) {
    match serde_json::to_string(event) {
        Ok(line) => info!(target: "booking.submitted", "{}", line),
        Err(e) => warn!("Failed to serialize booking event: {}", e),
    }
}
