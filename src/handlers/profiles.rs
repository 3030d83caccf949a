use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::Requester;
use crate::models::{Profile, UserType};
use crate::services::session;
use crate::state::AppState;

// POST /api/profiles
#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
}

#[derive(Serialize)]
pub struct CreateProfileResponse {
    profile: Profile,
    token: String,
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), AppError> {
    let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let profile = Profile {
        id: uuid::Uuid::new_v4().to_string(),
        first_name: trimmed(body.first_name),
        last_name: trimmed(body.last_name),
        business_name: trimmed(body.business_name),
        user_type: body.user_type,
        created_at: chrono::Utc::now().naive_utc(),
    };

    if profile.user_type == UserType::Owner && profile.business_name.is_none() {
        return Err(AppError::BadRequest(
            "business_name is required for owners".to_string(),
        ));
    }

    {
        let db = state.conn()?;
        queries::insert_profile(&db, &profile)?;
    }

    let token = session::issue_token(&state.config.session_secret, &profile.id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to sign session token")))?;

    tracing::info!(profile_id = %profile.id, user_type = profile.user_type.as_str(), "profile created");

    Ok((
        StatusCode::CREATED,
        Json(CreateProfileResponse { profile, token }),
    ))
}

// GET /api/profiles/me
pub async fn me(requester: Requester) -> Json<Profile> {
    Json(requester.profile)
}
