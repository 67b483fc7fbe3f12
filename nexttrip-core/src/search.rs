use serde::{Deserialize, Deserializer, Serialize};
use chrono::NaiveDate;
use nexttrip_shared::Money;

/// Query for `GET /flights/search`. Unset filters are left off the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passengers: Option<u32>,
}

/// A flight row as the backend returns it from `/flights` and `/flights/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub flight_id: String,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub trip_type: Option<String>,
    pub departure_city_code: String,
    pub arrival_city_code: String,
    #[serde(default)]
    pub departure_datetime: Option<String>,
    #[serde(default)]
    pub arrival_datetime: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub cabin_class: Option<String>,
    pub seats_available: i64,
    #[serde(default)]
    pub baggage_allowance: Option<String>,
    #[serde(default)]
    pub flight_status: Option<String>,
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub destination_country: Option<String>,
}

/// City autocomplete entry from `GET /cities/search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitySuggestion {
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
    })
}
