//! Reference data routes: roles, cities, cohorts and modules.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::extract::{ApiQuery, JsonBody};
use super::{AppError, AppState};
use crate::auth::Principal;
use crate::models::{City, Cohort, Module, NewRole, Role};

#[derive(Debug, Default, Deserialize)]
pub struct CohortQuery {
    pub city: Option<String>,
}

/// GET /roles
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.store.list_roles().await?))
}

/// POST /roles (admin)
pub async fn create_role(
    State(state): State<AppState>,
    principal: Principal,
    JsonBody(body): JsonBody<NewRole>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    principal.require_admin()?;
    let role = state.store.create_role(&body.validated()?).await?;
    tracing::info!(role_id = role.id, name = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /cities
pub async fn list_cities(State(state): State<AppState>) -> Result<Json<Vec<City>>, AppError> {
    Ok(Json(state.store.list_cities().await?))
}

/// GET /cohorts?city=
pub async fn list_cohorts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CohortQuery>,
) -> Result<Json<Vec<Cohort>>, AppError> {
    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    Ok(Json(state.store.list_cohorts(city).await?))
}

/// GET /modules
pub async fn list_modules(State(state): State<AppState>) -> Result<Json<Vec<Module>>, AppError> {
    Ok(Json(state.store.list_modules().await?))
}
