//! HTTP API for the class planner.
//!
//! Every handler reaches the data through `AppState::store`; authenticated
//! handlers take a [`crate::auth::Principal`] argument, which rejects the
//! request with 401 before the handler runs.

pub mod auth_routes;
pub mod error;
pub mod extract;
pub mod reference_routes;
pub mod session_routes;
pub mod user_routes;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenIssuer;
use crate::slack::SlackClient;
use crate::store::PlannerStore;

pub use error::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlannerStore>,
    pub tokens: Arc<TokenIssuer>,
    /// `None` disables `POST /auth/slack`.
    pub slack: Option<Arc<SlackClient>>,
}

impl AppState {
    pub fn new(store: Arc<dyn PlannerStore>, tokens: TokenIssuer) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            slack: None,
        }
    }

    pub fn with_slack(mut self, slack: SlackClient) -> Self {
        self.slack = Some(Arc::new(slack));
        self
    }
}

/// Build the full router with every route plus tracing and CORS layers.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        // Sessions
        .route(
            "/session",
            get(session_routes::list_sessions).post(session_routes::create_session),
        )
        .route(
            "/session/:id",
            get(session_routes::get_session)
                .put(session_routes::update_session)
                .delete(session_routes::delete_session),
        )
        .route(
            "/session/:id/attendance",
            get(session_routes::list_attendance),
        )
        .route(
            "/session/:id/signup",
            post(session_routes::sign_up).delete(session_routes::cancel_sign_up),
        )
        .route("/signup-details", get(session_routes::sign_up_details))
        // Reference data
        .route(
            "/roles",
            get(reference_routes::list_roles).post(reference_routes::create_role),
        )
        .route("/cities", get(reference_routes::list_cities))
        .route("/cohorts", get(reference_routes::list_cohorts))
        .route("/modules", get(reference_routes::list_modules))
        // People
        .route(
            "/users",
            get(user_routes::list_users).post(user_routes::create_user),
        )
        .route(
            "/users/:id",
            get(user_routes::get_user).put(user_routes::update_user),
        )
        .route("/users/:id/title", put(user_routes::update_title))
        // Auth
        .route("/auth/slack", post(auth_routes::slack_sign_in))
        .route("/auth/me", get(auth_routes::me))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the browser front-end. `None` allows any origin.
pub fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    match allow_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => {
            if let Some(origin) = allow_origin {
                tracing::warn!("ignoring unparseable CORS origin '{}'", origin);
            }
            layer.allow_origin(Any)
        }
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
