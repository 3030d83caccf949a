use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Profile, UserType};
use crate::services::session;
use crate::state::AppState;

/// The authenticated caller. Handlers pass `profile.id` into the booking core
/// explicitly; nothing below this layer reads session state.
#[derive(Debug, Clone)]
pub struct Requester {
    pub profile: Profile,
}

impl Requester {
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn require_owner(&self) -> Result<(), AppError> {
        if self.profile.user_type != UserType::Owner {
            return Err(AppError::Forbidden("workspace owners only".to_string()));
        }
        Ok(())
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn authenticate(state: &AppState, token: &str) -> Result<Requester, AppError> {
    let profile_id =
        session::verify_token(&state.config.session_secret, token).ok_or(AppError::Unauthorized)?;

    let profile = {
        let db = state.conn()?;
        queries::get_profile(&db, &profile_id)?
    };

    profile
        .map(|profile| Requester { profile })
        .ok_or(AppError::Unauthorized)
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        authenticate(state, token)
    }
}

pub fn check_admin(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    match bearer_token(headers) {
        Some(token) if token == expected_token => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}
