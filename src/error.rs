//! Error handling for the class planner
//!
//! Every store, validation and auth failure is expressed as a
//! [`PlannerError`]. The HTTP layer maps each variant onto a status code via
//! [`PlannerError::http_status`]; nothing below the API layer knows about
//! HTTP.

use thiserror::Error;

/// Main error type for the class planner
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PlannerError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::Upstream(_) => 502,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(error: reqwest::Error) -> Self {
        PlannerError::Upstream(error.to_string())
    }
}

/// Result type alias for convenience
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_covers_every_variant() {
        assert_eq!(PlannerError::NotFound("x".into()).http_status(), 404);
        assert_eq!(PlannerError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(PlannerError::Unauthorized("x".into()).http_status(), 401);
        assert_eq!(PlannerError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(PlannerError::Conflict("x".into()).http_status(), 409);
        assert_eq!(PlannerError::Upstream("x".into()).http_status(), 502);
        assert_eq!(PlannerError::Unavailable("x".into()).http_status(), 503);
        assert_eq!(
            PlannerError::Internal(anyhow::anyhow!("boom")).http_status(),
            500
        );
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            PlannerError::not_found("session", 7).to_string(),
            "not found: session 7"
        );
        assert_eq!(
            PlannerError::invalid("module_week must be at least 1").to_string(),
            "invalid input: module_week must be at least 1"
        );
        assert_eq!(
            PlannerError::Internal(anyhow::anyhow!("pool closed")).to_string(),
            "internal: pool closed"
        );
    }
}
