use std::sync::Arc;
use std::net::SocketAddr;
use nexttrip_api::{app, state::{AppState, AuthConfig}, worker};
use nexttrip_client::{Config, HttpBackendClient};
use nexttrip_wizard::SessionManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexttrip_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting NextTrip API on port {}", config.server.port);

    // Stateless: user calls carry the caller's own token
    let backend = Arc::new(HttpBackendClient::from_config(&config.backend).expect("Failed to build backend client"));
    tracing::info!("Backend at {}", backend.base_url());

    let sessions = Arc::new(SessionManager::new(chrono::Duration::seconds(
        config.wizard.session_ttl_seconds as i64,
    )));
    worker::start_session_sweeper(
        sessions.clone(),
        std::time::Duration::from_secs(config.wizard.sweep_interval_seconds.max(1)),
    );

    let app_state = AppState {
        sessions,
        bookings: backend.clone(),
        catalog: backend.clone(),
        accounts: backend,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
