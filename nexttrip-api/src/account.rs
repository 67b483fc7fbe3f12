use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use nexttrip_core::identity::{Credentials, SessionContext, ACCESS_COOKIE};
use nexttrip_shared::models::events::{AuditAction, AuditEvent, AuditStatus};

use crate::audit;
use crate::error::AppError;
use crate::middleware::request_token;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/session", get(session))
}

fn access_cookie(value: String) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Sign in against the backend and hand its token to the browser as an
/// HTTP-only cookie.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<SessionContext>), AppError> {
    let mut ctx = SessionContext::pending();
    let result = ctx.login(state.accounts.as_ref(), &credentials).await;

    let status = if result.is_ok() { AuditStatus::Success } else { AuditStatus::Failed };
    audit::record(&AuditEvent::new(&credentials.email, AuditAction::Login, status, "Sign in"));

    let token = result?;
    Ok((jar.add(access_cookie(token.into_inner())), Json(ctx)))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<SessionContext>) {
    let mut ctx = SessionContext::resolved(None);
    if let Some(token) = request_token(&headers) {
        ctx.logout(state.accounts.as_ref(), &token).await;
    }
    (jar.remove(Cookie::build(ACCESS_COOKIE).path("/")), Json(ctx))
}

/// Who the browser is signed in as, resolved through the backend.
async fn session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionContext>, AppError> {
    let token = request_token(&headers);
    Ok(Json(SessionContext::bootstrap(state.accounts.as_ref(), token.as_ref()).await?))
}
