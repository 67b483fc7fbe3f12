use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use nexttrip_core::booking::BookingConfirmation;
use nexttrip_core::flight::FlightSelection;
use nexttrip_core::payment::{PaymentInstrument, PaymentMethod};
use nexttrip_core::traveler::{ContactInfo, TravelerRecord};
use nexttrip_shared::models::events::{AuditAction, AuditEvent, AuditStatus, BookingSubmittedEvent};
use nexttrip_wizard::pricing::passenger_bounds;
use nexttrip_wizard::{
    BookingCustomization, CustomizationInput, PriceQuote, StepInput, WizardError, WizardSession, WizardState,
    WizardStep,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::error::AppError;
use crate::middleware::{booking_wizard_gate, Caller};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct OpenSessionRequest {
    flight_id: String,
}

#[derive(Debug, Deserialize)]
struct ReopenRequest {
    step: WizardStep,
}

/// What the wizard pages render. Payment details never leave the server;
/// only the chosen method is echoed back.
#[derive(Debug, Serialize)]
pub struct SessionView {
    id: Uuid,
    state: WizardState,
    current_step: Option<WizardStep>,
    flight: FlightSelection,
    route: String,
    min_passengers: u32,
    max_passengers: u32,
    customization: BookingCustomization,
    contact: Option<ContactInfo>,
    travelers: Vec<TravelerRecord>,
    payment_method: Option<PaymentMethod>,
    quote: PriceQuote,
    last_error: Option<String>,
    confirmation: Option<BookingConfirmation>,
    updated_at: DateTime<Utc>,
}

impl From<&WizardSession> for SessionView {
    fn from(session: &WizardSession) -> Self {
        let bounds = passenger_bounds(session.flight());
        Self {
            id: session.id(),
            state: session.state(),
            current_step: session.current_step(),
            flight: session.flight().clone(),
            route: session.flight().route_label(),
            min_passengers: *bounds.start(),
            max_passengers: *bounds.end(),
            customization: *session.customization(),
            contact: session.contact().cloned(),
            travelers: session.travelers().to_vec(),
            payment_method: session.payment().map(PaymentInstrument::method),
            quote: session.quote(),
            last_error: session.last_error().map(str::to_string),
            confirmation: session.confirmation().cloned(),
            updated_at: session.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitResponse {
    #[serde(flatten)]
    confirmation: BookingConfirmation,
    session: SessionView,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/wizard/sessions", post(open_session))
        .route("/v1/wizard/sessions/{id}", axum::routing::get(get_session).delete(delete_session))
        .route("/v1/wizard/sessions/{id}/customization", put(put_customization))
        .route("/v1/wizard/sessions/{id}/contact", put(put_contact))
        .route("/v1/wizard/sessions/{id}/travelers", put(put_travelers))
        .route("/v1/wizard/sessions/{id}/payment", put(put_payment))
        .route("/v1/wizard/sessions/{id}/reopen", post(reopen_step))
        .route("/v1/wizard/sessions/{id}/commit", post(commit_session))
        .route_layer(axum::middleware::from_fn_with_state(state, booking_wizard_gate))
}

fn check_owner(session: &WizardSession, caller: &Caller) -> Result<(), AppError> {
    if session.owner() != caller.subject {
        return Err(AppError::AuthorizationError("This booking does not belong to you".to_string()));
    }
    Ok(())
}

async fn open_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let record = state
        .catalog
        .list_flights()
        .await?
        .into_iter()
        .find(|f| f.flight_id == req.flight_id)
        .ok_or(WizardError::NoFlightSelected)?;
    let flight = FlightSelection::try_from(record).map_err(WizardError::from)?;

    let (id, handle) = state.sessions.open(&caller.subject, flight).await;
    let session = handle.lock().await;

    audit::record(
        &AuditEvent::new(
            &caller.email,
            AuditAction::SessionStarted,
            AuditStatus::Success,
            format!("Booking started for {}", session.flight().route_label()),
        )
        .for_session(id)
        .on_resource(session.flight().flight_id()),
    );

    Ok((StatusCode::CREATED, Json(SessionView::from(&*session))))
}

async fn get_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(&id).await?;
    let session = handle.lock().await;
    check_owner(&session, &caller)?;
    Ok(Json(SessionView::from(&*session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handle = state.sessions.get(&id).await?;
    check_owner(&*handle.lock().await, &caller)?;
    state.sessions.discard(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_step(state: &AppState, caller: &Caller, id: Uuid, input: StepInput) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    check_owner(&session, caller)?;

    let step = input.step();
    session.advance(input)?;

    audit::record(
        &AuditEvent::new(
            &caller.email,
            AuditAction::StepCompleted,
            AuditStatus::Success,
            format!("{} step completed", step),
        )
        .for_session(id),
    );

    Ok(Json(SessionView::from(&*session)))
}

async fn put_customization(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<CustomizationInput>,
) -> Result<Json<SessionView>, AppError> {
    apply_step(&state, &caller, id, StepInput::Customization(input)).await
}

async fn put_contact(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<ContactInfo>,
) -> Result<Json<SessionView>, AppError> {
    apply_step(&state, &caller, id, StepInput::Contact(input)).await
}

async fn put_travelers(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<Vec<TravelerRecord>>,
) -> Result<Json<SessionView>, AppError> {
    apply_step(&state, &caller, id, StepInput::Travelers(input)).await
}

async fn put_payment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<PaymentInstrument>,
) -> Result<Json<SessionView>, AppError> {
    apply_step(&state, &caller, id, StepInput::Payment(input)).await
}

async fn reopen_step(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReopenRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    check_owner(&session, &caller)?;

    session.reopen(req.step)?;

    audit::record(
        &AuditEvent::new(
            &caller.email,
            AuditAction::StepReopened,
            AuditStatus::Success,
            format!("{} step reopened", req.step),
        )
        .for_session(id),
    );

    Ok(Json(SessionView::from(&*session)))
}

async fn commit_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CommitResponse>), AppError> {
    let handle = state.sessions.get(&id).await?;
    let _in_flight = handle.begin_commit()?;
    let mut session = handle.lock().await;
    check_owner(&session, &caller)?;

    let result = session.commit(state.bookings.as_ref(), &caller.access_token).await;

    match &result {
        Ok(confirmation) => {
            let booking_id = confirmation.booking_id().unwrap_or_default();
            audit::record(
                &AuditEvent::new(
                    &caller.email,
                    AuditAction::CreateBooking,
                    AuditStatus::Success,
                    format!("Booked {} seat(s) on {}", session.customization().passengers, session.flight().flight_id()),
                )
                .for_session(id)
                .on_resource(booking_id),
            );
            audit::booking_submitted(&BookingSubmittedEvent {
                session_id: id,
                flight_id: session.flight().flight_id().to_string(),
                subject: caller.subject.clone(),
                num_seats: session.customization().passengers,
                amount_minor: session.quote().total.minor(),
                currency: session.flight().currency().to_string(),
                payment_method: session.payment().map(|p| p.method().to_string()).unwrap_or_default(),
                timestamp: Utc::now().timestamp(),
            });
        }
        Err(e) => {
            audit::record(
                &AuditEvent::new(
                    &caller.email,
                    AuditAction::CreateBooking,
                    AuditStatus::Failed,
                    format!("Booking failed: {}", e),
                )
                .for_session(id),
            );
        }
    }

    let confirmation = result?;
    Ok((
        StatusCode::CREATED,
        Json(CommitResponse {
            confirmation,
            session: SessionView::from(&*session),
        }),
    ))
}
