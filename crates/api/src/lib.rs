//! Robot Storefront API Server
//!
//! REST API for the storefront: local and Google accounts with a JWT
//! session cookie, the robot catalog, and per-user orders.

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod auth;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;

pub use config::{ApiConfig, GoogleConfig};
pub use error::ApiError;
pub use routes::oauth::{GoogleOAuth, OAuthProvider};

use auth::TokenKeys;
use rate_limit::{create_governor_config, Quota, RateLimitConfig};
use storage::Repository;

/// State handle passed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Application state shared across handlers
pub struct AppState {
    pub repository: Repository,
    pub config: ApiConfig,
    pub tokens: TokenKeys,
    pub oauth: Option<Arc<dyn OAuthProvider>>,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// State with an empty repository; Google sign-in is wired when configured
    pub fn new(config: ApiConfig) -> Self {
        let oauth = config
            .google()
            .cloned()
            .map(|google| Arc::new(GoogleOAuth::new(google)) as Arc<dyn OAuthProvider>);
        Self {
            repository: Repository::new(),
            tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl_hours),
            config,
            oauth,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_oauth(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth = Some(provider);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub records: RecordCounts,
}

#[derive(Debug, Serialize)]
pub struct RecordCounts {
    pub users: usize,
    pub robots: usize,
    pub orders: usize,
}

/// Create the application router
pub fn create_router(state: SharedState, config: &ApiConfig) -> Router {
    let limits = &config.rate_limit;
    let credentials = limited(
        Router::new().route("/api/login", post(routes::auth::login)),
        limits,
        limits.login,
        "login",
    )
    .merge(limited(
        Router::new().route("/api/register", post(routes::auth::register)),
        limits,
        limits.register,
        "register",
    ))
    .merge(limited(
        Router::new()
            .route("/auth/google", get(routes::oauth::google_login))
            .route("/auth/google/callback", get(routes::oauth::google_callback)),
        limits,
        limits.oauth,
        "oauth",
    ));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/test", get(routes::auth::test))
        .route("/api/logout", post(routes::auth::logout))
        .route("/api/profile", get(routes::auth::profile))
        .route("/api/robots", get(routes::robots::list).post(routes::robots::create))
        .route("/api/robots/:id", get(routes::robots::get))
        .route("/api/orders", get(routes::orders::list).post(routes::orders::create))
        .route("/metrics", get(metrics_handler))
        .merge(credentials)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wrap `routes` in a per-IP governor for `quota`
fn limited(
    routes: Router<SharedState>,
    limits: &RateLimitConfig,
    quota: Quota,
    name: &str,
) -> Router<SharedState> {
    match create_governor_config(limits, quota) {
        Some(governor) => {
            info!(
                "Rate limiting {} routes: burst {}, one per {}s",
                name, quota.burst_size, quota.per_second
            );
            routes.layer(GovernorLayer { config: governor })
        }
        None => routes,
    }
}

/// Credentialed CORS for the configured front-end origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let repo = &state.repository;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        records: RecordCounts {
            users: repo.user_count(),
            robots: repo.robot_count(),
            orders: repo.order_count(),
        },
    })
}

/// Prometheus text exposition; 404 when the exporter is off
async fn metrics_handler(State(state): State<SharedState>) -> Response {
    match &state.read().await.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics exporter unavailable: {}", e);
            None
        }
    }
}

/// Initialize logging at `level` (`trace`, `debug`, `info`, `warn`, `error`)
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Serve `state` until the process is stopped
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let app = create_router(Arc::new(RwLock::new(state)), &config);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
