//! Per-page checks. Each returns the value the session stores, or the first
//! problem found; nothing is partially applied.

use chrono::NaiveDate;
use nexttrip_core::flight::FlightSelection;
use nexttrip_core::payment::PaymentInstrument;
use nexttrip_core::traveler::{ContactInfo, TravelerRecord};
use nexttrip_core::ValidationError;

use crate::models::{BookingCustomization, CustomizationInput};
use crate::pricing;

pub fn customization(flight: &FlightSelection, input: &CustomizationInput) -> BookingCustomization {
    pricing::clamp_customization(flight, input)
}

pub fn contact(input: &ContactInfo) -> Result<ContactInfo, ValidationError> {
    input.validate()?;
    Ok(ContactInfo::new(input.email.trim()))
}

/// One record per passenger, each complete.
pub fn travelers(
    customization: &BookingCustomization,
    input: &[TravelerRecord],
    today: NaiveDate,
) -> Result<Vec<TravelerRecord>, ValidationError> {
    if input.len() != customization.passengers as usize {
        return Err(ValidationError::TravelerCount {
            expected: customization.passengers,
            actual: input.len(),
        });
    }
    for traveler in input {
        traveler.validate(today)?;
    }
    Ok(input.to_vec())
}

pub fn payment(input: &PaymentInstrument, today: NaiveDate) -> Result<PaymentInstrument, ValidationError> {
    input.validate(today)?;
    Ok(input.clone())
}
