use chrono::{DateTime, NaiveDateTime};
use nexttrip_shared::{Money, DEFAULT_CURRENCY};
use serde::Serialize;

use crate::search::FlightRecord;
use crate::ValidationError;

pub const DEFAULT_BAGGAGE_ALLOWANCE: &str = "23kg";
pub const DEFAULT_CABIN_CLASS: &str = "Economy";

/// The flight a wizard session was opened for.
///
/// Built once from a search result and never mutated afterwards; every field
/// is read-only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlightSelection {
    flight_id: String,
    airline: String,
    origin: String,
    destination: String,
    departure: Option<NaiveDateTime>,
    arrival: Option<NaiveDateTime>,
    base_price: Money,
    currency: String,
    cabin_class: String,
    seats_available: u32,
    baggage_allowance: String,
}

impl FlightSelection {
    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    pub fn airline(&self) -> &str {
        &self.airline
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.departure
    }

    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.arrival
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn cabin_class(&self) -> &str {
        &self.cabin_class
    }

    pub fn seats_available(&self) -> u32 {
        self.seats_available
    }

    pub fn baggage_allowance(&self) -> &str {
        &self.baggage_allowance
    }

    /// Route label as the itinerary header shows it, e.g. `ACCRA → KUMASI`.
    pub fn route_label(&self) -> String {
        format!("{} → {}", self.origin.to_uppercase(), self.destination.to_uppercase())
    }
}

impl TryFrom<FlightRecord> for FlightSelection {
    type Error = ValidationError;

    fn try_from(record: FlightRecord) -> Result<Self, Self::Error> {
        crate::required("flight_id", &record.flight_id)?;
        crate::required("departure_city_code", &record.departure_city_code)?;
        crate::required("arrival_city_code", &record.arrival_city_code)?;

        if record.seats_available < 1 {
            return Err(ValidationError::NoSeatsAvailable);
        }
        if record.price.is_negative() {
            return Err(ValidationError::invalid("price", "must not be negative"));
        }

        let departure = record
            .departure_datetime
            .as_deref()
            .map(|raw| parse_timestamp(raw).ok_or_else(|| ValidationError::invalid("departure_datetime", raw)))
            .transpose()?;
        let arrival = record
            .arrival_datetime
            .as_deref()
            .map(|raw| parse_timestamp(raw).ok_or_else(|| ValidationError::invalid("arrival_datetime", raw)))
            .transpose()?;

        Ok(Self {
            flight_id: record.flight_id,
            airline: record.airline.unwrap_or_default(),
            origin: record.departure_city_code,
            destination: record.arrival_city_code,
            departure,
            arrival,
            base_price: record.price,
            currency: DEFAULT_CURRENCY.to_string(),
            cabin_class: record.cabin_class.unwrap_or_else(|| DEFAULT_CABIN_CLASS.to_string()),
            seats_available: u32::try_from(record.seats_available).unwrap_or(u32::MAX),
            baggage_allowance: record
                .baggage_allowance
                .unwrap_or_else(|| DEFAULT_BAGGAGE_ALLOWANCE.to_string()),
        })
    }
}

/// The backend emits ISO-8601 from some endpoints and RFC 2822 (`Sat, 01 Mar
/// 2025 08:30:00 GMT`) from others.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn record() -> FlightRecord {
        serde_json::from_value(serde_json::json!({
            "flight_id": "NT-101",
            "airline": "NextTrip Air",
            "departure_city_code": "Accra",
            "arrival_city_code": "Kumasi",
            "departure_datetime": "Sat, 01 Mar 2025 08:30:00 GMT",
            "arrival_datetime": "2025-03-01T09:25:00",
            "price": 1000,
            "seats_available": 5
        }))
        .unwrap()
    }

    #[test]
    fn test_selection_from_record() {
        let flight = FlightSelection::try_from(record()).unwrap();
        assert_eq!(flight.flight_id(), "NT-101");
        assert_eq!(flight.base_price(), Money::from_major(1000));
        assert_eq!(flight.currency(), "GHS");
        assert_eq!(flight.cabin_class(), "Economy");
        assert_eq!(flight.baggage_allowance(), "23kg");
        assert_eq!(flight.route_label(), "ACCRA → KUMASI");

        let departure = flight.departure().unwrap();
        assert_eq!(departure.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(departure.hour(), 8);
        assert_eq!(flight.arrival().unwrap().minute(), 25);
    }

    #[test]
    fn test_sold_out_flight_cannot_be_selected() {
        let mut sold_out = record();
        sold_out.seats_available = 0;
        assert_eq!(FlightSelection::try_from(sold_out), Err(ValidationError::NoSeatsAvailable));
    }

    #[test]
    fn test_garbage_timestamp_is_rejected() {
        let mut bad = record();
        bad.departure_datetime = Some("next tuesday".into());
        let err = FlightSelection::try_from(bad).unwrap_err();
        assert_eq!(err.field(), Some("departure_datetime"));
    }
}
