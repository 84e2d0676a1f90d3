//! People routes
//!
//! Listing and creating people is admin-only. Reading and editing a single
//! profile is allowed for the person themselves and for admins.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::extract::{ApiPath, JsonBody};
use super::{AppError, AppState};
use crate::auth::Principal;
use crate::error::PlannerError;
use crate::models::{required_text, NewPerson, Person, ProfileUpdate};

#[derive(Debug, Deserialize)]
pub struct TitleUpdate {
    pub title: String,
}

/// GET /users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Person>>, AppError> {
    principal.require_admin()?;
    Ok(Json(state.store.list_people().await?))
}

/// POST /users (admin)
pub async fn create_user(
    State(state): State<AppState>,
    principal: Principal,
    JsonBody(body): JsonBody<NewPerson>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    principal.require_admin()?;
    let person = state.store.create_person(&body.validated()?).await?;
    tracing::info!(person_id = person.id, by = principal.person_id, "person created");
    Ok((StatusCode::CREATED, Json(person)))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Person>, AppError> {
    principal.require_self_or_admin(id)?;
    let person = state
        .store
        .get_person(id)
        .await?
        .ok_or_else(|| PlannerError::not_found("person", id))?;
    Ok(Json(person))
}

/// PUT /users/:id
pub async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
    JsonBody(body): JsonBody<ProfileUpdate>,
) -> Result<Json<Person>, AppError> {
    principal.require_self_or_admin(id)?;
    let person = state
        .store
        .update_person(id, &body.validated()?)
        .await?
        .ok_or_else(|| PlannerError::not_found("person", id))?;
    Ok(Json(person))
}

/// PUT /users/:id/title
pub async fn update_title(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<i32>,
    JsonBody(body): JsonBody<TitleUpdate>,
) -> Result<Json<Person>, AppError> {
    principal.require_self_or_admin(id)?;
    let title = required_text("title", &body.title)?;
    let person = state
        .store
        .update_title(id, &title)
        .await?
        .ok_or_else(|| PlannerError::not_found("person", id))?;
    Ok(Json(person))
}
