pub mod auth;

pub use auth::{admin_bookings_gate, booking_wizard_gate, request_token, Caller, Claims};
