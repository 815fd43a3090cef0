use std::convert::Infallible;

use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

async fn bearer_token(parts: &mut Parts) -> Result<Option<String>, AppError> {
    let header = parts
        .extract::<Option<TypedHeader<Authorization<Bearer>>>>()
        .await
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
    Ok(header.map(|TypedHeader(auth)| auth.token().to_string()))
}

async fn authorize(token: &str, state: &SharedState) -> Result<AuthUser, AppError> {
    let user = state.identity.validate_token(token).await?;
    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
    })
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
        authorize(&token, state).await
    }
}

/// The raw bearer token, if one was sent. Never rejects and never validates;
/// callers decide whether the token matters.
#[derive(Debug, Clone, Default)]
pub struct BearerCredential(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for BearerCredential {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerCredential(bearer_token(parts).await.ok().flatten()))
    }
}
