use nexttrip_core::booking::CabinClass;
use nexttrip_core::flight::FlightSelection;
use nexttrip_shared::Money;
use serde::Serialize;
use std::ops::RangeInclusive;

use crate::models::{BookingCustomization, CustomizationInput};

/// Hard cap on passengers per booking, regardless of inventory.
pub const MAX_PASSENGERS: u32 = 9;
pub const MAX_EXTRA_BAGGAGE: u8 = 3;
pub const BAGGAGE_UNIT_PRICE: Money = Money::from_major(50);

/// Fixed upgrade surcharge per cabin, in the flight's currency.
pub fn class_surcharge(cabin: CabinClass) -> Money {
    match cabin {
        CabinClass::Economy => Money::ZERO,
        CabinClass::Business => Money::from_major(200),
        CabinClass::FirstClass => Money::from_major(500),
    }
}

/// `1..=min(seats_available, 9)`.
pub fn passenger_bounds(flight: &FlightSelection) -> RangeInclusive<u32> {
    1..=flight.seats_available().clamp(1, MAX_PASSENGERS)
}

/// Clamp raw form values into range; the itinerary form never rejects a count.
pub fn clamp_customization(flight: &FlightSelection, input: &CustomizationInput) -> BookingCustomization {
    let bounds = passenger_bounds(flight);
    let passengers = input
        .passengers
        .clamp(i64::from(*bounds.start()), i64::from(*bounds.end())) as u32;
    let extra_baggage = input.extra_baggage.clamp(0, i64::from(MAX_EXTRA_BAGGAGE)) as u8;

    BookingCustomization {
        passengers,
        cabin_class: input.cabin_class,
        extra_baggage,
        meal_preference: input.meal_preference,
    }
}

/// A price breakdown, always derived from the current customization.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub base_fare: Money,
    pub class_surcharge: Money,
    pub baggage_surcharge: Money,
    pub per_passenger: Money,
    pub passengers: u32,
    pub total: Money,
    pub currency: String,
}

/// `(base + class surcharge + 50 * bags) * passengers`
pub fn quote(flight: &FlightSelection, customization: &BookingCustomization) -> PriceQuote {
    let class_surcharge = class_surcharge(customization.cabin_class);
    let baggage_surcharge = BAGGAGE_UNIT_PRICE * u32::from(customization.extra_baggage);
    let per_passenger = flight.base_price() + class_surcharge + baggage_surcharge;

    PriceQuote {
        base_fare: flight.base_price(),
        class_surcharge,
        baggage_surcharge,
        per_passenger,
        passengers: customization.passengers,
        total: per_passenger * customization.passengers,
        currency: flight.currency().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::flight;
    use super::*;
    use nexttrip_core::booking::MealPreference;

    fn input(passengers: i64, cabin_class: CabinClass, extra_baggage: i64) -> CustomizationInput {
        CustomizationInput { passengers, cabin_class, extra_baggage, meal_preference: MealPreference::Standard }
    }

    #[test]
    fn test_quote_matches_formula() {
        let flight = flight(500, 20);
        let c = clamp_customization(&flight, &input(3, CabinClass::Business, 2));
        let q = quote(&flight, &c);
        assert_eq!(q.per_passenger, Money::from_major(800));
        assert_eq!(q.total, Money::from_major(2400));
        assert_eq!(q.currency, "GHS");
    }

    #[test]
    fn test_quote_over_every_cabin_and_bag_count() {
        let flight = flight(1000, 9);
        for cabin in CabinClass::ALL {
            for bags in 0..=3 {
                for pax in 1..=9 {
                    let c = clamp_customization(&flight, &input(pax, cabin, bags));
                    let expected = (1000 + class_surcharge(cabin).minor() / 100 + 50 * bags) * pax;
                    assert_eq!(quote(&flight, &c).total, Money::from_major(expected));
                }
            }
        }
    }

    #[test]
    fn test_passenger_bounds() {
        assert_eq!(passenger_bounds(&flight(100, 3)), 1..=3);
        assert_eq!(passenger_bounds(&flight(100, 40)), 1..=9);
        assert_eq!(passenger_bounds(&flight(100, 1)), 1..=1);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let flight = flight(100, 4);
        let c = clamp_customization(&flight, &input(12, CabinClass::Economy, 7));
        assert_eq!(c.passengers, 4);
        assert_eq!(c.extra_baggage, 3);

        let c = clamp_customization(&flight, &input(0, CabinClass::Economy, -2));
        assert_eq!(c.passengers, 1);
        assert_eq!(c.extra_baggage, 0);
    }

    #[test]
    fn test_fractional_base_price_does_not_drift() {
        let record: nexttrip_core::search::FlightRecord = serde_json::from_value(serde_json::json!({
            "flight_id": "NT-7",
            "departure_city_code": "Accra",
            "arrival_city_code": "Tamale",
            "price": "0.10",
            "seats_available": 9
        }))
        .unwrap();
        let flight = FlightSelection::try_from(record).unwrap();
        let c = clamp_customization(&flight, &input(3, CabinClass::Economy, 0));
        assert_eq!(quote(&flight, &c).total.minor(), 30);
    }
}
