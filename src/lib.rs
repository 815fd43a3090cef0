pub mod auth;
pub mod chaos;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod proxy;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::any::Any;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::db::Directory;
use crate::error::AppError;
use crate::proxy::Forwarder;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(
    directory: Arc<dyn Directory>,
    config: Config,
) -> Result<(Router, SharedState), AppError> {
    let forwarder = Forwarder::new(config.upstream_timeout)
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

    let identity = IdentityProvider::new(
        directory.clone(),
        config.jwt_secret.clone(),
        config.token_ttl,
    );

    let cors = cors_layer(&config.cors_origins);

    let state: SharedState = Arc::new(AppState {
        directory,
        identity,
        forwarder,
        config,
        login_limiter: LoginRateLimiter::default(),
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::proxy_routes())
        .route("/", axum::routing::get(root))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state.clone());

    Ok((app, state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(format!("Handler panicked: {detail}")).into_response()
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "LatencyPoison",
        "description": "Network Chaos Proxy",
        "endpoints": {
            "/proxy": "Forward requests with configurable latency and failure rate",
            "/api/auth": "Authentication endpoints",
            "/api/collections": "Collections endpoints",
            "/api/endpoints": "Endpoints endpoints",
        }
    }))
}

async fn health() -> &'static str {
    "ok"
}
