//! Session routes: the calendar listing, admin session management and
//! volunteer sign-ups.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::extract::{ApiPath, ApiQuery, JsonBody};
use super::{AppError, AppState};
use crate::auth::Principal;
use crate::error::PlannerError;
use crate::models::{Attendee, NewSession, Session, SessionFilter, SignUp, SignUpDetail};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    /// Comma-separated city names
    pub city: Option<String>,
    pub cohort_id: Option<i32>,
    pub module_id: Option<i32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
}

impl From<SessionQuery> for SessionFilter {
    fn from(query: SessionQuery) -> Self {
        SessionFilter {
            cities: SessionFilter::parse_cities(query.city.as_deref()),
            cohort_id: query.cohort_id,
            module_id: query.module_id,
            from: query.from,
            to: query.to,
            q: query.q,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub role_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignUpDetailsQuery {
    pub user_id: Option<i32>,
    pub session_id: Option<i32>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /session
pub async fn list_sessions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Vec<Session>>, AppError> {
    let filter = SessionFilter::from(query);
    filter.validate()?;
    Ok(Json(state.store.list_sessions(&filter).await?))
}

/// GET /session/:id
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Session>, AppError> {
    let session = state
        .store
        .get_session(id)
        .await?
        .ok_or_else(|| PlannerError::not_found("session", id))?;
    Ok(Json(session))
}

/// POST /session (admin)
pub async fn create_session(
    State(state): State<AppState>,
    principal: Principal,
    JsonBody(body): JsonBody<NewSession>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    principal.require_admin()?;
    let session = state.store.create_session(&body.validated()?).await?;
    info!(session_id = session.id, by = principal.person_id, "session created");
    Ok((StatusCode::CREATED, Json(session)))
}

/// PUT /session/:id (admin)
pub async fn update_session(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
    JsonBody(body): JsonBody<NewSession>,
) -> Result<Json<Session>, AppError> {
    principal.require_admin()?;
    let session = state
        .store
        .update_session(id, &body.validated()?)
        .await?
        .ok_or_else(|| PlannerError::not_found("session", id))?;
    info!(session_id = id, by = principal.person_id, "session updated");
    Ok(Json(session))
}

/// DELETE /session/:id (admin)
pub async fn delete_session(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    principal.require_admin()?;
    if !state.store.delete_session(id).await? {
        return Err(PlannerError::not_found("session", id).into());
    }
    info!(session_id = id, by = principal.person_id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /session/:id/attendance
pub async fn list_attendance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Vec<Attendee>>, AppError> {
    if state.store.get_session(id).await?.is_none() {
        return Err(PlannerError::not_found("session", id).into());
    }
    Ok(Json(state.store.list_attendees(id).await?))
}

/// POST /session/:id/signup
///
/// Signs the caller up; signing up again for the same session changes role.
pub async fn sign_up(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
    JsonBody(body): JsonBody<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUp>), AppError> {
    let sign_up = state
        .store
        .insert_sign_up(id, body.role_id, principal.person_id)
        .await?;
    info!(
        session_id = id,
        person_id = principal.person_id,
        role_id = body.role_id,
        "signed up"
    );
    Ok((StatusCode::CREATED, Json(sign_up)))
}

/// DELETE /session/:id/signup
pub async fn cancel_sign_up(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, AppError> {
    let cancelled = state.store.cancel_sign_up(id, principal.person_id).await?;
    if cancelled {
        info!(session_id = id, person_id = principal.person_id, "sign-up cancelled");
    }
    Ok(Json(json!({ "cancelled": cancelled })))
}

/// GET /signup-details?user_id=&session_id=
///
/// Defaults to the caller; other people's sign-ups are admin-only.
pub async fn sign_up_details(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<SignUpDetailsQuery>,
) -> Result<Json<Vec<SignUpDetail>>, AppError> {
    let person_id = query.user_id.unwrap_or(principal.person_id);
    principal.require_self_or_admin(person_id)?;
    Ok(Json(
        state
            .store
            .sign_up_details(person_id, query.session_id)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_becomes_filter() {
        let filter = SessionFilter::from(SessionQuery {
            city: Some("London, Manchester".into()),
            cohort_id: Some(2),
            ..Default::default()
        });
        assert_eq!(filter.cities, vec!["London", "Manchester"]);
        assert_eq!(filter.cohort_id, Some(2));
        assert_eq!(filter.module_id, None);
    }
}
