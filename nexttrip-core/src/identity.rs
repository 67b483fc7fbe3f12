use async_trait::async_trait;
use nexttrip_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::repository::BackendError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" | "super_admin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The signed-in account as `GET /me` reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The backend's session JWT, forwarded on every call made for a user.
pub type AccessToken = Masked<String>;

/// Cookie the backend reads the access token from.
pub const ACCESS_COOKIE: &str = "access_token";

/// A successful `POST /login`.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub access_token: AccessToken,
}

/// Snapshot of who is signed in, handed to whatever needs it instead of a
/// global provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub user: Option<User>,
    pub loading: bool,
}

/// Clears `loading` when dropped, so a cancelled call cannot leave it set.
struct Loading<'a>(&'a mut bool);

impl<'a> Loading<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl SessionContext {
    /// State before the first `/me` round-trip has finished.
    pub fn pending() -> Self {
        Self { user: None, loading: true }
    }

    pub fn resolved(user: Option<User>) -> Self {
        Self { user, loading: false }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Resolve the current user. No token, or a 401, means nobody is signed in.
    pub async fn bootstrap(auth: &dyn AuthApi, token: Option<&AccessToken>) -> Result<Self, BackendError> {
        let Some(token) = token else {
            return Ok(Self::resolved(None));
        };
        match auth.current_user(token).await {
            Ok(user) => Ok(Self::resolved(user)),
            Err(BackendError::Auth) => Ok(Self::resolved(None)),
            Err(e) => Err(e),
        }
    }

    /// Sign in and hand back the token the caller must keep for later calls.
    pub async fn login(&mut self, auth: &dyn AuthApi, credentials: &Credentials) -> Result<AccessToken, BackendError> {
        let result = {
            let _loading = Loading::start(&mut self.loading);
            auth.login(credentials).await
        };
        let signed_in = result?;
        self.user = Some(signed_in.user);
        Ok(signed_in.access_token)
    }

    /// Clears local state even when the backend call fails.
    pub async fn logout(&mut self, auth: &dyn AuthApi, token: &AccessToken) {
        if let Err(e) = auth.logout(token).await {
            tracing::warn!("Logout request failed: {}", e);
        }
        self.user = None;
        self.loading = false;
    }
}

/// Login / logout / whoami against the backend. Every call after login
/// names the user it is made for.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<SignedIn, BackendError>;

    async fn logout(&self, token: &AccessToken) -> Result<(), BackendError>;

    async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubAuth {
        me: Mutex<Result<Option<User>, BackendError>>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl StubAuth {
        fn new(me: Result<Option<User>, BackendError>) -> Self {
            Self { me: Mutex::new(me), seen_tokens: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl AuthApi for StubAuth {
        async fn login(&self, credentials: &Credentials) -> Result<SignedIn, BackendError> {
            if credentials.password == "secret" {
                Ok(SignedIn {
                    user: User { email: credentials.email.clone(), firstname: None, lastname: None, role: Role::User },
                    access_token: Masked::from("jwt-for-ama"),
                })
            } else {
                Err(BackendError::BusinessRule { status: 404, message: "Incorrect password".into() })
            }
        }

        async fn logout(&self, token: &AccessToken) -> Result<(), BackendError> {
            self.seen_tokens.lock().unwrap().push(token.expose().clone());
            Err(BackendError::Network("offline".into()))
        }

        async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError> {
            self.seen_tokens.lock().unwrap().push(token.expose().clone());
            self.me.lock().unwrap().clone()
        }
    }

    struct HangingAuth;

    #[async_trait]
    impl AuthApi for HangingAuth {
        async fn login(&self, _credentials: &Credentials) -> Result<SignedIn, BackendError> {
            std::future::pending::<Result<SignedIn, BackendError>>().await
        }

        async fn logout(&self, _token: &AccessToken) -> Result<(), BackendError> {
            Ok(())
        }

        async fn current_user(&self, _token: &AccessToken) -> Result<Option<User>, BackendError> {
            Ok(None)
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("pilot".parse::<Role>().is_err());
        assert_eq!(serde_json::to_value(Role::SuperAdmin).unwrap(), "superadmin");
    }

    #[tokio::test]
    async fn test_bootstrap_treats_401_as_anonymous() {
        let token = Masked::from("stale");
        let auth = StubAuth::new(Err(BackendError::Auth));
        let ctx = SessionContext::bootstrap(&auth, Some(&token)).await.unwrap();
        assert_eq!(ctx, SessionContext::resolved(None));
        assert!(!ctx.loading);
        assert_eq!(*auth.seen_tokens.lock().unwrap(), vec!["stale".to_string()]);

        let auth = StubAuth::new(Err(BackendError::Network("down".into())));
        assert!(SessionContext::bootstrap(&auth, Some(&token)).await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_skips_backend() {
        let auth = StubAuth::new(Err(BackendError::Network("down".into())));
        let ctx = SessionContext::bootstrap(&auth, None).await.unwrap();
        assert!(!ctx.is_authenticated());
        assert!(auth.seen_tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let auth = StubAuth::new(Ok(None));
        let mut ctx = SessionContext::pending();

        let bad = Credentials { email: "ama@example.com".into(), password: "nope".into() };
        assert!(ctx.login(&auth, &bad).await.is_err());
        assert!(!ctx.loading);
        assert!(!ctx.is_authenticated());

        let good = Credentials { email: "ama@example.com".into(), password: "secret".into() };
        let token = ctx.login(&auth, &good).await.unwrap();
        assert_eq!(token.expose(), "jwt-for-ama");
        assert_eq!(ctx.role(), Some(Role::User));

        ctx.logout(&auth, &token).await;
        assert!(!ctx.is_authenticated());
        assert_eq!(*auth.seen_tokens.lock().unwrap(), vec!["jwt-for-ama".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_login_stops_loading() {
        let mut ctx = SessionContext::resolved(None);
        let credentials = Credentials { email: "ama@example.com".into(), password: "secret".into() };

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            ctx.login(&HangingAuth, &credentials),
        )
        .await;
        assert!(attempt.is_err());
        assert!(!ctx.loading);
        assert!(!ctx.is_authenticated());
    }
}
