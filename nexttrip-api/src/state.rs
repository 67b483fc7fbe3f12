use std::sync::Arc;
use nexttrip_core::booking::BookingApi;
use nexttrip_core::identity::AuthApi;
use nexttrip_core::repository::FlightCatalog;
use nexttrip_wizard::SessionManager;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub bookings: Arc<dyn BookingApi>,
    pub catalog: Arc<dyn FlightCatalog>,
    pub accounts: Arc<dyn AuthApi>,
    pub auth: AuthConfig,
}
