use async_trait::async_trait;
use nexttrip_core::booking::{BookingApi, BookingConfirmation, BookingRequest};
use nexttrip_core::identity::{AccessToken, AuthApi, Credentials, SignedIn, User, ACCESS_COOKIE};
use nexttrip_core::repository::{BackendError, FlightCatalog};
use nexttrip_core::search::{CitySuggestion, FlightRecord, FlightSearchQuery};
use nexttrip_shared::Masked;
use reqwest::header::COOKIE;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app_config::BackendConfig;
use crate::error::ClientError;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// `{message, access_token, user}` from `POST /login`.
#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    user: User,
}

/// `{user}` from `GET /me`; `user` is null when the account is gone.
#[derive(Deserialize)]
struct MeResponse {
    user: Option<User>,
}

/// The flight backend over HTTP.
///
/// Shared by every request the service handles, so it keeps no cookies of
/// its own. Calls made for a user carry that user's token explicitly.
#[derive(Clone)]
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// The backend reads the `access_token` cookie; the bearer header is for
    /// deployments that check `Authorization` instead.
    fn request_as(&self, method: Method, path: &str, token: &AccessToken) -> RequestBuilder {
        self.request(method, path)
            .header(COOKIE, format!("{}={}", ACCESS_COOKIE, token.expose()))
            .bearer_auth(token.expose())
    }

    async fn send<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, ClientError> {
        let response = rb.send().await?;
        let status = response.status();
        debug!(status = %status, url = %response.url(), "Backend responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl FlightCatalog for HttpBackendClient {
    async fn search_flights(&self, query: &FlightSearchQuery) -> Result<Vec<FlightRecord>, BackendError> {
        let rb = self.request(Method::GET, "/flights/search").query(query);
        Ok(self.send(rb).await?)
    }

    async fn list_flights(&self) -> Result<Vec<FlightRecord>, BackendError> {
        Ok(self.send(self.request(Method::GET, "/flights")).await?)
    }

    async fn search_cities(&self, q: &str) -> Result<Vec<CitySuggestion>, BackendError> {
        let q = q.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }
        let rb = self.request(Method::GET, "/cities/search").query(&[("q", q)]);
        Ok(self.send(rb).await?)
    }
}

#[async_trait]
impl BookingApi for HttpBackendClient {
    async fn book_flight(
        &self,
        request: &BookingRequest,
        idempotency_key: Uuid,
        access_token: &AccessToken,
    ) -> Result<BookingConfirmation, BackendError> {
        info!(
            flight_id = %request.flight_id,
            seats = request.num_seats,
            amount = %request.payment_amount,
            key = %idempotency_key,
            "Posting booking"
        );
        let rb = self
            .request_as(Method::POST, "/bookflight", access_token)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(request);
        Ok(self.send(rb).await?)
    }

    async fn cancel_booking(&self, booking_id: &str, access_token: &AccessToken) -> Result<Value, BackendError> {
        let rb = self
            .request_as(Method::POST, "/cancelbooking", access_token)
            .json(&json!({ "booking_id": booking_id }));
        Ok(self.send(rb).await?)
    }
}

#[async_trait]
impl AuthApi for HttpBackendClient {
    async fn login(&self, credentials: &Credentials) -> Result<SignedIn, BackendError> {
        let rb = self.request(Method::POST, "/login").json(credentials);
        let body: LoginResponse = self.send(rb).await?;
        info!(email = %body.user.email, role = %body.user.role, "Signed in");
        Ok(SignedIn {
            user: body.user,
            access_token: Masked::new(body.access_token),
        })
    }

    async fn logout(&self, token: &AccessToken) -> Result<(), BackendError> {
        let _: Value = self.send(self.request_as(Method::POST, "/logout", token)).await?;
        Ok(())
    }

    async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError> {
        match self.send::<MeResponse>(self.request_as(Method::GET, "/me", token)).await {
            Ok(body) => Ok(body.user),
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
