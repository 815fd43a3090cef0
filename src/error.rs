use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::db::StoreError;
use crate::proxy::ProxyError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    #[error("Simulated Failure: {0}")]
    SimulatedFailure(String),
    #[error("Bad Gateway: {0}")]
    BadGateway(String),
    #[error("Gateway Timeout: {0}")]
    GatewayTimeout(String),
    #[error("Internal Error: {0}")]
    Internal(String),
    #[error("Store Error: {0}")]
    Store(StoreError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::SimulatedFailure(_) | AppError::Internal(_) | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg)
            | AppError::SimulatedFailure(msg)
            | AppError::BadGateway(msg)
            | AppError::GatewayTimeout(msg) => msg,
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                "Internal server error".to_string()
            }
        };

        let mut response = (status, axum::Json(json!({ "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        let msg = err.to_string();
        match err {
            ProxyError::InvalidArgument(_) => AppError::BadRequest(msg),
            ProxyError::Unauthorized => AppError::Unauthorized(msg),
            ProxyError::NotFound => AppError::NotFound(msg),
            ProxyError::SimulatedFailure => AppError::SimulatedFailure(msg),
            ProxyError::GatewayTimeout(_) => AppError::GatewayTimeout(msg),
            ProxyError::BadGateway(_) => AppError::BadGateway(msg),
            ProxyError::Directory(store) => store.into(),
        }
    }
}
