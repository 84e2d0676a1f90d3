//! Sign-in routes.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extract::JsonBody;
use super::{AppError, AppState};
use crate::auth::Principal;
use crate::error::PlannerError;
use crate::models::Person;
use crate::slack::upsert_person;

#[derive(Debug, Deserialize)]
pub struct SlackSignInRequest {
    pub code: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Person,
}

/// POST /auth/slack
pub async fn slack_sign_in(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SlackSignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let slack = state
        .slack
        .as_ref()
        .ok_or_else(|| PlannerError::Unavailable("Slack sign-in is not configured".into()))?;

    let code = body.code.trim();
    if code.is_empty() {
        return Err(PlannerError::invalid("code must not be empty").into());
    }

    let profile = slack.sign_in(code, body.redirect_uri.as_deref()).await?;
    let user = upsert_person(state.store.as_ref(), &profile).await?;
    let issued = state.tokens.issue(&user)?;
    tracing::info!(person_id = user.id, "signed in with Slack");

    Ok(Json(SignInResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Person>, AppError> {
    // A valid token for a deleted person is treated as signed out.
    let person = state
        .store
        .get_person(principal.person_id)
        .await?
        .ok_or_else(|| PlannerError::Unauthorized("person no longer exists".into()))?;
    Ok(Json(person))
}
