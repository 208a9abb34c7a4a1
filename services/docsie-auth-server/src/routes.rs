//! HTTP routes
//!
//! Token and configuration endpoints are served both at the root and under
//! `/api`, which is where the widget client looks for them.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docsie_auth::{DEFAULT_REDIRECT_URL, DEMO_SUBJECT, ENV_DEPLOYMENT_KEY, TokenIssuer};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::ApiError;

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub issuer: TokenIssuer,
    pub deployment_key: Option<String>,
    pub redirect_url: String,
    pub login_page: PathBuf,
    pub stats: ServiceStats,
    pub prometheus: PrometheusHandle,
}

/// Counters reported on `/health`
#[derive(Clone, Debug)]
pub struct ServiceStats {
    pub tokens_issued: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self {
            tokens_issued: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing and `null` fields both deserialize to `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsieConfigResponse {
    pub deployment_id: String,
    pub redirect_url: String,
}

/// Build the axum router with all routes and shared state.
///
/// `max_connections` bounds concurrent requests via a tower concurrency limit.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login_handler).get(login_page_handler))
        .route("/auth/token", post(token_handler))
        .route("/config/docsie", get(docsie_config_handler));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

fn issue_for(state: &AppState, subject: &str, route: &'static str) -> Result<String, ApiError> {
    let issued = state.issuer.issue(subject)?;
    state.stats.tokens_issued.fetch_add(1, Ordering::Relaxed);
    crate::metrics::record_token_issued(route);
    Ok(issued.token)
}

/// Credentials are only checked for presence; any non-empty pair is accepted.
async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (Some(username), Some(_)) = (
        request.username.filter(|u| !u.is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        warn!("login rejected: missing username or password");
        return Err(ApiError::BadRequest("Username and password are required"));
    };

    let token = issue_for(&state, &username, "login")?;
    Ok(Json(TokenResponse { token }))
}

async fn token_handler(State(state): State<AppState>) -> Result<Json<TokenResponse>, ApiError> {
    let token = issue_for(&state, DEMO_SUBJECT, "token")?;
    Ok(Json(TokenResponse { token }))
}

async fn login_page_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(&state.login_page).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(path = %state.login_page.display(), error = %e, "login page unavailable");
            crate::metrics::record_rejected("not_found");
            (StatusCode::NOT_FOUND, "Login page not found").into_response()
        }
    }
}

async fn docsie_config_handler(
    State(state): State<AppState>,
) -> Result<Json<DocsieConfigResponse>, ApiError> {
    let deployment_id = state
        .deployment_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or(ApiError::NotConfigured(ENV_DEPLOYMENT_KEY))?;

    let redirect_url = if state.redirect_url.is_empty() {
        DEFAULT_REDIRECT_URL.to_owned()
    } else {
        state.redirect_url.clone()
    };

    info!(%deployment_id, %redirect_url, "serving Docsie config");
    Ok(Json(DocsieConfigResponse {
        deployment_id,
        redirect_url,
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.stats.started_at.elapsed().as_secs(),
        "tokens_issued": state.stats.tokens_issued.load(Ordering::Relaxed),
    }))
}

/// Prometheus metrics endpoint, text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
