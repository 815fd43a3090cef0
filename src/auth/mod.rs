pub mod extractor;
pub mod jwt;
pub mod password;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::db::Directory;
use crate::error::AppError;
use crate::models::{NewUser, User};

pub use extractor::{AuthUser, BearerCredential};

pub struct IdentityProvider {
    directory: Arc<dyn Directory>,
    secret: String,
    ttl: Duration,
}

impl IdentityProvider {
    pub fn new(directory: Arc<dyn Directory>, secret: String, ttl: Duration) -> Self {
        Self {
            directory,
            secret,
            ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<User, AppError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "Username, email, and password are required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        password::check_policy(password).map_err(AppError::BadRequest)?;

        self.create(username, email, password, full_name).await
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<User, AppError> {
        let password_hash = password::hash_off_runtime(password.to_string())
            .await
            .map_err(AppError::Internal)?;

        let user = self
            .directory
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.filter(|n| !n.trim().is_empty()),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Principal registered");
        Ok(user)
    }

    /// Unknown login, wrong password and disabled accounts are reported identically.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AppError> {
        let rejected = || AppError::Unauthorized("Incorrect username or password".to_string());

        let user = self
            .directory
            .find_user_by_login(login.trim())
            .await?
            .ok_or_else(rejected)?;

        let valid = password::verify_off_runtime(password.to_string(), user.password_hash.clone())
            .await
            .map_err(AppError::Internal)?;

        if !valid || user.disabled {
            return Err(rejected());
        }
        Ok(user)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let claims = jwt::Claims::new(user_id, self.ttl);
        jwt::encode_token(&claims, &self.secret).map_err(AppError::Internal)
    }

    /// Every rejection is the same `Unauthorized`.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let rejected = || AppError::Unauthorized("Could not validate credentials".to_string());

        let claims = jwt::decode_token(token, &self.secret).map_err(|e| {
            tracing::debug!("Token rejected: {e}");
            rejected()
        })?;

        match self.directory.find_user_by_id(claims.sub).await? {
            Some(user) if !user.disabled => Ok(user),
            _ => Err(rejected()),
        }
    }

    /// Create the demo principal unless a principal with that login exists.
    pub async fn seed_demo_user(&self) -> Result<(), AppError> {
        if self.directory.find_user_by_login("demo").await?.is_some() {
            tracing::info!("Demo user already exists");
            return Ok(());
        }
        // The demo password predates the length policy, so skip `register`
        self.create("demo", "demo@example.com", "demo123", Some("Demo User".to_string()))
            .await?;
        tracing::info!("Demo user created (demo / demo123)");
        Ok(())
    }
}
