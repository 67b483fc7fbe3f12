use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use nexttrip_core::access::{gate, Gate, Route};
use nexttrip_core::identity::{AccessToken, Role, ACCESS_COOKIE};
use nexttrip_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

/// Verified caller identity, injected into request extensions.
///
/// Keeps the token it was verified from: backend calls made for this caller
/// must present it.
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: String,
    pub email: String,
    pub role: Role,
    pub access_token: AccessToken,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
}

/// The raw token from the `Authorization` header or the `access_token`
/// cookie, unverified.
pub fn request_token(headers: &HeaderMap) -> Option<AccessToken> {
    bearer_token(headers).or_else(|| cookie_token(headers)).map(Masked::new)
}

/// `None` when no token was sent; an error when one was sent but is bad.
pub fn authenticate(auth: &AuthConfig, headers: &HeaderMap) -> Result<Option<Caller>, AppError> {
    let Some(token) = request_token(headers) else {
        return Ok(None);
    };

    let token_data = decode::<Claims>(
        token.expose(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid or expired token: {}", e)))?;

    let claims = token_data.claims;
    let role = claims
        .role
        .parse::<Role>()
        .map_err(AppError::AuthenticationError)?;

    Ok(Some(Caller {
        subject: claims.sub,
        email: claims.email,
        role,
        access_token: token,
    }))
}

async fn guard(route: Route, state: &AppState, mut req: Request, next: Next) -> Result<Response, AppError> {
    let caller = authenticate(&state.auth, req.headers())?;

    match gate(route, caller.as_ref().map(|c| c.role)) {
        Gate::Allow => {}
        Gate::Redirect(target) if caller.is_none() => {
            return Err(AppError::AuthenticationError(format!("Login required ({})", target)));
        }
        Gate::Redirect(_) => {
            return Err(AppError::AuthorizationError(format!(
                "Your role may not open {}",
                route.path()
            )));
        }
    }

    if let Some(caller) = caller {
        req.extensions_mut().insert(caller);
    }
    Ok(next.run(req).await)
}

// ============================================================================
// Route gates
// ============================================================================

pub async fn booking_wizard_gate(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    guard(Route::BookingWizard, &state, req, next).await
}

pub async fn admin_bookings_gate(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    guard(Route::AdminBookings, &state, req, next).await
}
