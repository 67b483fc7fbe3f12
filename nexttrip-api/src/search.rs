use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use nexttrip_core::search::{CitySuggestion, FlightRecord, FlightSearchQuery};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CityQuery {
    #[serde(default)]
    q: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(list_flights))
        .route("/v1/flights/search", get(search_flights))
        .route("/v1/cities/search", get(search_cities))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<FlightRecord>>, AppError> {
    Ok(Json(state.catalog.list_flights().await?))
}

async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightSearchQuery>,
) -> Result<Json<Vec<FlightRecord>>, AppError> {
    let flights = state.catalog.search_flights(&query).await?;
    info!(
        origin = ?query.origin,
        destination = ?query.destination,
        results = flights.len(),
        "Flight search"
    );
    Ok(Json(flights))
}

async fn search_cities(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<Vec<CitySuggestion>>, AppError> {
    Ok(Json(state.catalog.search_cities(&query.q).await?))
}
