use async_trait::async_trait;
use chrono::NaiveDate;
use nexttrip_shared::Money;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::identity::AccessToken;
use crate::payment::{PaymentDetails, PaymentMethod};
use crate::repository::BackendError;
use crate::traveler::Title;

// ============================================================================
// Customization enums
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum CabinClass {
    #[default]
    Economy,
    Business,
    #[serde(rename = "First Class")]
    FirstClass,
}

impl CabinClass {
    pub const ALL: [CabinClass; 3] = [CabinClass::Economy, CabinClass::Business, CabinClass::FirstClass];

    pub fn label(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::Business => "Business",
            CabinClass::FirstClass => "First Class",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MealPreference {
    #[default]
    Standard,
    Vegetarian,
    Vegan,
    Halal,
    Kosher,
    #[serde(rename = "Gluten Free")]
    GlutenFree,
    Diabetic,
}

// ============================================================================
// POST /bookflight
// ============================================================================

/// One passenger as sent alongside the lead traveler's top-level fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TravelerPayload {
    pub title: Title,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
}

/// The single request that commits a wizard session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub flight_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub num_seats: u32,
    pub cabin_class: CabinClass,
    pub extra_baggage: u8,
    pub meal_preference: MealPreference,
    pub payment_method: PaymentMethod,
    pub payment_amount: Money,
    pub payment_details: PaymentDetails,
    pub travelers: Vec<TravelerPayload>,
}

/// A row the backend hands back; the id is normalized, everything else is
/// forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BackendRecord {
    pub fn id(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// `201 {message, booking, payment}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfirmation {
    #[serde(default)]
    pub message: Option<String>,
    pub booking: BackendRecord,
    pub payment: BackendRecord,
}

impl BookingConfirmation {
    pub fn booking_id(&self) -> Option<String> {
        self.booking.id("booking_id")
    }
}

// ============================================================================
// Booking API seam
// ============================================================================

/// The external service that persists bookings and settles payment.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Submit a booking. Sent once per call; `idempotency_key` lets the
    /// backend collapse duplicates of the same session.
    /// The backend books under the account `access_token` belongs to.
    async fn book_flight(
        &self,
        request: &BookingRequest,
        idempotency_key: Uuid,
        access_token: &AccessToken,
    ) -> Result<BookingConfirmation, BackendError>;

    /// Admin-side cancellation (`POST /cancelbooking`).
    async fn cancel_booking(&self, booking_id: &str, access_token: &AccessToken) -> Result<Value, BackendError>;
}
