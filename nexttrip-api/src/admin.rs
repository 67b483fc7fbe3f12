use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use nexttrip_shared::models::events::{AuditAction, AuditEvent, AuditStatus};
use serde_json::Value;

use crate::audit;
use crate::error::AppError;
use crate::middleware::{admin_bookings_gate, Caller};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/bookings/{id}/cancel", post(cancel_booking))
        .route_layer(axum::middleware::from_fn_with_state(state, admin_bookings_gate))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let result = state.bookings.cancel_booking(&booking_id, &caller.access_token).await;

    let status = if result.is_ok() { AuditStatus::Success } else { AuditStatus::Failed };
    audit::record(
        &AuditEvent::new(
            &caller.email,
            AuditAction::CancelBooking,
            status,
            format!("Cancel booking {} as {}", booking_id, caller.role),
        )
        .on_resource(&booking_id),
    );

    Ok(Json(result?))
}
