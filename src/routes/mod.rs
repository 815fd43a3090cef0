pub mod auth;
pub mod collections;
pub mod endpoints;
pub mod proxy;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // Collections
        .route(
            "/api/collections",
            get(collections::list).post(collections::create),
        )
        .route(
            "/api/collections/{id}",
            get(collections::get)
                .put(collections::update)
                .delete(collections::delete),
        )
        // Endpoints
        .route(
            "/api/collections/{id}/endpoints",
            get(endpoints::list_by_collection).post(endpoints::create),
        )
        .route(
            "/api/endpoints/{id}",
            get(endpoints::get)
                .put(endpoints::update)
                .delete(endpoints::delete),
        )
}

pub fn proxy_routes() -> Router<SharedState> {
    Router::new().route("/proxy", get(proxy::proxy))
}
