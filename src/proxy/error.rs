use std::time::Duration;

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidArgument(String),
    /// Stored mode without an authenticated principal.
    #[error("Not authenticated")]
    Unauthorized,
    /// Missing endpoint, or one owned by someone else. The two are never told apart.
    #[error("Endpoint not found")]
    NotFound,
    #[error("Simulated failure injected by latency-poison")]
    SimulatedFailure,
    #[error("Downstream did not respond within {}s", .0.as_secs())]
    GatewayTimeout(Duration),
    #[error("Error forwarding request: {0}")]
    BadGateway(String),
    #[error(transparent)]
    Directory(#[from] StoreError),
}
