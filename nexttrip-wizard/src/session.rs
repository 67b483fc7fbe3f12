use chrono::{DateTime, NaiveDate, Utc};
use nexttrip_core::booking::{BookingApi, BookingConfirmation, BookingRequest, TravelerPayload};
use nexttrip_core::flight::FlightSelection;
use nexttrip_core::identity::AccessToken;
use nexttrip_core::payment::{PaymentDetails, PaymentInstrument};
use nexttrip_core::repository::BackendError;
use nexttrip_core::traveler::{ContactInfo, TravelerRecord};
use nexttrip_core::ValidationError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BookingCustomization, StepInput, WizardState, WizardStep};
use crate::pricing::{self, PriceQuote};
use crate::steps;

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot submit the {step} step while the booking is {state}")]
    InvalidTransition { state: WizardState, step: WizardStep },

    #[error("Cannot reopen the {step} step while the booking is {state}")]
    InvalidReopen { state: WizardState, step: WizardStep },

    #[error("Booking is not ready to submit (state {0})")]
    NotReady(WizardState),

    #[error("This booking has already been submitted")]
    SessionClosed,

    #[error("No flight selected.")]
    NoFlightSelected,

    #[error("A submission for this booking is already in progress")]
    SubmissionInProgress,

    #[error("{}", .0.user_message())]
    Submission(BackendError),
}

/// Pure transition function: where `input` takes a session currently in
/// `current`, without looking at the input's contents.
pub fn next_state(current: WizardState, input: &StepInput) -> Result<WizardState, WizardError> {
    use WizardState::*;

    let step = input.step();
    match (current, step) {
        (Submitted, _) => Err(WizardError::SessionClosed),
        (Selected | Customizing, WizardStep::Customization) => Ok(Customizing),
        (Customizing, WizardStep::Contact) => Ok(ContactCollected),
        (ContactCollected, WizardStep::Travelers) => Ok(TravelerCollected),
        (TravelerCollected | PaymentPending | Failed, WizardStep::Payment) => Ok(PaymentPending),
        (state, step) => Err(WizardError::InvalidTransition { state, step }),
    }
}

/// One customer's in-progress booking.
///
/// Holds the flight it was opened for plus every slice collected so far.
/// Slices from later steps survive a [`reopen`](Self::reopen) as drafts, but
/// the session only moves forward again by re-submitting each step.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    owner: String,
    flight: FlightSelection,
    customization: BookingCustomization,
    contact: Option<ContactInfo>,
    travelers: Vec<TravelerRecord>,
    payment: Option<PaymentInstrument>,
    state: WizardState,
    idempotency_key: Uuid,
    last_error: Option<String>,
    confirmation: Option<BookingConfirmation>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WizardSession {
    pub fn new(owner: impl Into<String>, flight: FlightSelection) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            flight,
            customization: BookingCustomization::default(),
            contact: None,
            travelers: Vec::new(),
            payment: None,
            state: WizardState::Selected,
            idempotency_key: Uuid::new_v4(),
            last_error: None,
            confirmation: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn flight(&self) -> &FlightSelection {
        &self.flight
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn customization(&self) -> &BookingCustomization {
        &self.customization
    }

    pub fn contact(&self) -> Option<&ContactInfo> {
        self.contact.as_ref()
    }

    pub fn travelers(&self) -> &[TravelerRecord] {
        &self.travelers
    }

    pub fn payment(&self) -> Option<&PaymentInstrument> {
        self.payment.as_ref()
    }

    pub fn idempotency_key(&self) -> Uuid {
        self.idempotency_key
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Recomputed on every call from the current customization.
    pub fn quote(&self) -> PriceQuote {
        pricing::quote(&self.flight, &self.customization)
    }

    pub fn current_step(&self) -> Option<WizardStep> {
        self.state.awaiting()
    }

    pub fn advance(&mut self, input: StepInput) -> Result<WizardState, WizardError> {
        self.advance_on(input, Utc::now().date_naive())
    }

    /// Validate `input` for the step it belongs to and move forward. On any
    /// error the session is left exactly as it was.
    pub fn advance_on(&mut self, input: StepInput, today: NaiveDate) -> Result<WizardState, WizardError> {
        let next = next_state(self.state, &input)?;

        match &input {
            StepInput::Customization(raw) => {
                self.customization = steps::customization(&self.flight, raw);
            }
            StepInput::Contact(raw) => {
                self.contact = Some(steps::contact(raw)?);
            }
            StepInput::Travelers(raw) => {
                self.travelers = steps::travelers(&self.customization, raw, today)?;
            }
            StepInput::Payment(raw) => {
                // Replaces whatever instrument was there, including its method.
                self.payment = Some(steps::payment(raw, today)?);
            }
        }

        info!(session_id = %self.id, from = %self.state, to = %next, "Wizard step {} completed", input.step());
        self.state = next;
        self.touch();
        Ok(next)
    }

    /// Go back to `step` for edits. Later slices are kept but must be
    /// re-submitted, so they are re-validated against whatever changes.
    pub fn reopen(&mut self, step: WizardStep) -> Result<WizardState, WizardError> {
        if self.state.is_terminal() {
            return Err(WizardError::SessionClosed);
        }
        if step > self.state.furthest_reopenable() {
            return Err(WizardError::InvalidReopen { state: self.state, step });
        }

        let next = step.reopened_state();
        info!(session_id = %self.id, from = %self.state, to = %next, "Wizard step {} reopened", step);
        self.state = next;
        self.touch();
        Ok(next)
    }

    /// Assemble the `POST /bookflight` body from the collected slices.
    /// Deterministic: the same session always yields the same request.
    pub fn build_request(&self) -> Result<BookingRequest, WizardError> {
        if !self.state.can_commit() {
            return Err(match self.state {
                WizardState::Submitted => WizardError::SessionClosed,
                state => WizardError::NotReady(state),
            });
        }

        let contact = self.contact.as_ref().ok_or(WizardError::NotReady(self.state))?;
        let payment = self.payment.as_ref().ok_or(WizardError::NotReady(self.state))?;
        let lead = self.travelers.first().ok_or(WizardError::NotReady(self.state))?;
        let quote = self.quote();

        Ok(BookingRequest {
            flight_id: self.flight.flight_id().to_string(),
            first_name: lead.first_name.trim().to_string(),
            last_name: lead.last_name.trim().to_string(),
            email: contact.email.clone(),
            phone: lead.international_mobile(),
            num_seats: self.customization.passengers,
            cabin_class: self.customization.cabin_class,
            extra_baggage: self.customization.extra_baggage,
            meal_preference: self.customization.meal_preference,
            payment_method: payment.method(),
            payment_amount: quote.total,
            payment_details: PaymentDetails::from(payment),
            travelers: self
                .travelers
                .iter()
                .map(|t| TravelerPayload {
                    title: t.title,
                    first_name: t.first_name.trim().to_string(),
                    last_name: t.last_name.trim().to_string(),
                    date_of_birth: t.date_of_birth,
                    phone: t.international_mobile(),
                })
                .collect(),
        })
    }

    /// Send the booking once, on behalf of the account `access_token`
    /// belongs to. On success the session is `Submitted`; on any failure it
    /// is `Failed` with every input intact, ready for another try.
    ///
    /// Nothing is written before the backend answers, so dropping this
    /// future mid-request leaves the session as it was.
    pub async fn commit(
        &mut self,
        api: &dyn BookingApi,
        access_token: &AccessToken,
    ) -> Result<BookingConfirmation, WizardError> {
        let request = self.build_request()?;

        let result = api.book_flight(&request, self.idempotency_key, access_token).await;
        self.touch();

        match result {
            Ok(confirmation) => {
                info!(
                    session_id = %self.id,
                    flight_id = %request.flight_id,
                    amount = %request.payment_amount,
                    method = %request.payment_method,
                    "Booking submitted"
                );
                self.state = WizardState::Submitted;
                self.last_error = None;
                self.confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                warn!(session_id = %self.id, "Booking submission failed: {}", e);
                self.state = WizardState::Failed;
                self.last_error = Some(e.user_message());
                Err(WizardError::Submission(e))
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomizationInput;
    use crate::pricing::fixtures::flight;
    use async_trait::async_trait;
    use nexttrip_core::booking::{CabinClass, MealPreference};
    use nexttrip_core::payment::{BillingAddress, CardPayment, MobileMoneyPayment, MomoProvider, PaymentMethod};
    use nexttrip_core::traveler::Title;
    use nexttrip_shared::Money;
    use std::sync::Mutex;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn customize(passengers: i64, cabin_class: CabinClass, extra_baggage: i64) -> StepInput {
        StepInput::Customization(CustomizationInput {
            passengers,
            cabin_class,
            extra_baggage,
            meal_preference: MealPreference::Vegetarian,
        })
    }

    fn traveler(first: &str) -> TravelerRecord {
        TravelerRecord {
            title: Title::Mr,
            first_name: first.into(),
            last_name: "Owusu".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2).unwrap(),
            mobile: "0201234567".into(),
        }
    }

    fn card() -> PaymentInstrument {
        PaymentInstrument::Card(CardPayment {
            card_holder_name: "Kwame Owusu".into(),
            card_number: "4111111111111111".into(),
            expiry: "08/28".into(),
            cvv: "321".into(),
            billing_address: BillingAddress {
                street: "4 Oxford St".into(),
                city: "Accra".into(),
                state: "Greater Accra".into(),
                zip: "GA-039".into(),
                country: "Ghana".into(),
            },
        })
    }

    fn momo() -> PaymentInstrument {
        PaymentInstrument::Momo(MobileMoneyPayment {
            provider: MomoProvider::Vodafone,
            phone_number: "0501234567".into(),
            country: "Ghana".into(),
        })
    }

    /// Session at PaymentPending: 2 pax, First Class, 1 bag on a 1000 fare.
    fn ready_session() -> WizardSession {
        let mut session = WizardSession::new("kwame@example.com", flight(1000, 5));
        session.advance_on(customize(2, CabinClass::FirstClass, 1), today()).unwrap();
        session.advance_on(StepInput::Contact(ContactInfo::new("kwame@example.com")), today()).unwrap();
        session
            .advance_on(StepInput::Travelers(vec![traveler("Kwame"), traveler("Yaw")]), today())
            .unwrap();
        session.advance_on(StepInput::Payment(card()), today()).unwrap();
        session
    }

    struct RecordingApi {
        responses: Mutex<Vec<Result<BookingConfirmation, BackendError>>>,
        seen: Mutex<Vec<(BookingRequest, Uuid, String)>>,
    }

    impl RecordingApi {
        fn new(mut responses: Vec<Result<BookingConfirmation, BackendError>>) -> Self {
            responses.reverse();
            Self { responses: Mutex::new(responses), seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl BookingApi for RecordingApi {
        async fn book_flight(
            &self,
            request: &BookingRequest,
            idempotency_key: Uuid,
            access_token: &AccessToken,
        ) -> Result<BookingConfirmation, BackendError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.clone(), idempotency_key, access_token.expose().clone()));
            self.responses.lock().unwrap().pop().expect("unexpected call")
        }

        async fn cancel_booking(&self, _booking_id: &str, _access_token: &AccessToken) -> Result<serde_json::Value, BackendError> {
            unimplemented!()
        }
    }

    /// A backend that never answers.
    struct HangingApi;

    #[async_trait]
    impl BookingApi for HangingApi {
        async fn book_flight(
            &self,
            _request: &BookingRequest,
            _idempotency_key: Uuid,
            _access_token: &AccessToken,
        ) -> Result<BookingConfirmation, BackendError> {
            std::future::pending::<Result<BookingConfirmation, BackendError>>().await
        }

        async fn cancel_booking(&self, _booking_id: &str, _access_token: &AccessToken) -> Result<serde_json::Value, BackendError> {
            unimplemented!()
        }
    }

    fn kwame_token() -> AccessToken {
        AccessToken::from("kwame-jwt")
    }

    fn confirmation() -> BookingConfirmation {
        serde_json::from_value(serde_json::json!({
            "message": "Flight booked successfully",
            "booking": {"booking_id": 501, "status": "confirmed"},
            "payment": {"payment_id": 9, "payment_status": "completed"}
        }))
        .unwrap()
    }

    #[test]
    fn test_next_state_table() {
        use WizardState::*;
        let contact = StepInput::Contact(ContactInfo::new("a@b.co"));
        let c = customize(1, CabinClass::Economy, 0);

        assert_eq!(next_state(Selected, &c).unwrap(), Customizing);
        assert_eq!(next_state(Customizing, &c).unwrap(), Customizing);
        assert_eq!(next_state(Customizing, &contact).unwrap(), ContactCollected);
        assert!(matches!(next_state(Selected, &contact), Err(WizardError::InvalidTransition { .. })));
        assert!(matches!(next_state(ContactCollected, &c), Err(WizardError::InvalidTransition { .. })));
        assert_eq!(next_state(Failed, &StepInput::Payment(momo())).unwrap(), PaymentPending);
        assert!(matches!(next_state(Submitted, &c), Err(WizardError::SessionClosed)));
    }

    #[test]
    fn test_full_walk_prices_and_builds_request() {
        let session = ready_session();
        assert_eq!(session.state(), WizardState::PaymentPending);
        assert_eq!(session.quote().total, Money::from_major(3100));

        let request = session.build_request().unwrap();
        assert_eq!(request.payment_amount, Money::from_major(3100));
        assert_eq!(request.num_seats, 2);
        assert_eq!(request.cabin_class, CabinClass::FirstClass);
        assert_eq!(request.meal_preference, MealPreference::Vegetarian);
        assert_eq!(request.first_name, "Kwame");
        assert_eq!(request.phone, "+233201234567");
        assert_eq!(request.travelers.len(), 2);
        assert_eq!(request.payment_method, PaymentMethod::Card);
        assert_eq!(request.payment_details.card_name.as_deref(), Some("Kwame Owusu"));
        assert!(request.payment_details.momo_number.is_none());
    }

    #[test]
    fn test_rejected_steps_leave_session_untouched() {
        let mut session = WizardSession::new("kwame@example.com", flight(1000, 5));
        session.advance_on(customize(2, CabinClass::Economy, 0), today()).unwrap();

        let err = session
            .advance_on(StepInput::Contact(ContactInfo::new("kwame.example.com")), today())
            .unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(session.state(), WizardState::Customizing);
        assert!(session.contact().is_none());

        session.advance_on(StepInput::Contact(ContactInfo::new(" kwame@example.com ")), today()).unwrap();
        assert_eq!(session.contact().unwrap().email, "kwame@example.com");

        // two passengers, one traveler
        let err = session
            .advance_on(StepInput::Travelers(vec![traveler("Kwame")]), today())
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::TravelerCount { expected: 2, actual: 1 })
        ));
        assert!(session.travelers().is_empty());
        assert_eq!(session.state(), WizardState::ContactCollected);
    }

    #[test]
    fn test_customization_frozen_after_contact() {
        let mut session = WizardSession::new("kwame@example.com", flight(1000, 5));
        session.advance_on(customize(1, CabinClass::Economy, 0), today()).unwrap();
        session.advance_on(StepInput::Contact(ContactInfo::new("k@example.com")), today()).unwrap();

        let err = session.advance_on(customize(3, CabinClass::Business, 0), today()).unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition { .. }));
        assert_eq!(session.customization().passengers, 1);
    }

    #[test]
    fn test_switching_payment_method_replaces_instrument() {
        let mut session = ready_session();
        session.advance_on(StepInput::Payment(momo()), today()).unwrap();

        let details = serde_json::to_value(session.build_request().unwrap().payment_details).unwrap();
        assert_eq!(details["momo_provider"], "Vodafone");
        assert!(details["card_name"].is_null());
        assert!(details["card_number"].is_null());
        assert!(details["deposit_ref"].is_null());
        assert!(details["address"].is_null());
    }

    #[test]
    fn test_reopen_requires_reentering_later_steps() {
        let mut session = ready_session();

        assert_eq!(session.reopen(WizardStep::Customization).unwrap(), WizardState::Customizing);
        session.advance_on(customize(3, CabinClass::FirstClass, 1), today()).unwrap();
        session.advance_on(StepInput::Contact(ContactInfo::new("kwame@example.com")), today()).unwrap();

        // still holding two travelers from before; three are now needed
        let stale = session.travelers().to_vec();
        assert!(session.advance_on(StepInput::Travelers(stale), today()).is_err());
        assert!(matches!(session.build_request(), Err(WizardError::NotReady(WizardState::ContactCollected))));

        session
            .advance_on(
                StepInput::Travelers(vec![traveler("Kwame"), traveler("Yaw"), traveler("Kofi")]),
                today(),
            )
            .unwrap();
        session.advance_on(StepInput::Payment(card()), today()).unwrap();
        assert_eq!(session.build_request().unwrap().payment_amount, Money::from_major(4650));
    }

    #[test]
    fn test_cannot_reopen_ahead() {
        let mut session = WizardSession::new("kwame@example.com", flight(1000, 5));
        session.advance_on(customize(1, CabinClass::Economy, 0), today()).unwrap();
        let err = session.reopen(WizardStep::Payment).unwrap_err();
        assert!(matches!(err, WizardError::InvalidReopen { .. }));
    }

    #[tokio::test]
    async fn test_commit_success_closes_session() {
        let api = RecordingApi::new(vec![Ok(confirmation())]);
        let mut session = ready_session();

        let result = session.commit(&api, &kwame_token()).await.unwrap();
        assert_eq!(result.booking_id().as_deref(), Some("501"));
        assert_eq!(session.state(), WizardState::Submitted);

        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.payment_amount, Money::from_major(3100));
        assert_eq!(seen[0].2, "kwame-jwt");
        drop(seen);

        assert!(matches!(session.commit(&api, &kwame_token()).await, Err(WizardError::SessionClosed)));
        assert!(matches!(session.reopen(WizardStep::Payment), Err(WizardError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_retry_after_business_rule_error_sends_same_payload() {
        let api = RecordingApi::new(vec![
            Err(BackendError::BusinessRule { status: 400, message: "Not enough seats available".into() }),
            Ok(confirmation()),
        ]);
        let mut session = ready_session();

        let err = session.commit(&api, &kwame_token()).await.unwrap_err();
        assert_eq!(err.to_string(), "Not enough seats available");
        assert_eq!(session.state(), WizardState::Failed);
        assert_eq!(session.last_error(), Some("Not enough seats available"));
        assert_eq!(session.travelers().len(), 2);

        session.commit(&api, &kwame_token()).await.unwrap();

        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(
            serde_json::to_string(&seen[0].0).unwrap(),
            serde_json::to_string(&seen[1].0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_network_error_keeps_inputs() {
        let api = RecordingApi::new(vec![Err(BackendError::Network("connection refused".into()))]);
        let mut session = ready_session();

        let err = session.commit(&api, &kwame_token()).await.unwrap_err();
        assert!(err.to_string().contains("couldn't reach"));
        assert_eq!(session.state(), WizardState::Failed);
        assert!(session.payment().is_some());
        assert_eq!(session.quote().total, Money::from_major(3100));
    }

    #[tokio::test]
    async fn test_commit_before_payment_is_refused_without_calling_api() {
        let api = RecordingApi::new(vec![]);
        let mut session = WizardSession::new("kwame@example.com", flight(1000, 5));
        session.advance_on(customize(1, CabinClass::Economy, 0), today()).unwrap();

        assert!(matches!(
            session.commit(&api, &kwame_token()).await,
            Err(WizardError::NotReady(WizardState::Customizing))
        ));
        assert!(api.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_commit_leaves_session_ready_to_retry() {
        let mut session = ready_session();

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            session.commit(&HangingApi, &kwame_token()),
        )
        .await;
        assert!(attempt.is_err());
        assert_eq!(session.state(), WizardState::PaymentPending);
        assert!(session.last_error().is_none());

        let api = RecordingApi::new(vec![Ok(confirmation())]);
        session.commit(&api, &kwame_token()).await.unwrap();
        assert_eq!(session.state(), WizardState::Submitted);
        assert_eq!(api.seen.lock().unwrap()[0].1, session.idempotency_key());
    }
}
