use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::db::Directory;
use crate::proxy::Forwarder;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub directory: Arc<dyn Directory>,
    pub identity: IdentityProvider,
    pub forwarder: Forwarder,
    pub config: Config,
    pub login_limiter: LoginRateLimiter,
}
