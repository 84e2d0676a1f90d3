//! Class Planner - session scheduling and volunteer sign-ups
//!
//! Back-end for a volunteer-run coding school: admins schedule sessions (a
//! module week taught to a cohort), volunteers sign in with Slack and sign up
//! to sessions in a role.
//!
//! ## Layout
//! - `models`: records and payload validation
//! - `store`: the `PlannerStore` port with an in-memory implementation
//! - `database`: the PostgreSQL implementation and migrations
//! - `api`: axum routes over `Arc<dyn PlannerStore>`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use class_planner::store::{InMemoryStore, PlannerStore};
//! use class_planner::models::SessionFilter;
//!
//! # async fn demo() -> class_planner::error::PlannerResult<()> {
//! let store = InMemoryStore::with_demo_data().await?;
//! let sessions = store.list_sessions(&SessionFilter::default()).await?;
//! assert!(!sessions.is_empty());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod auth;
pub mod config;
pub mod models;
pub mod slack;
pub mod store;

// Database integration (when enabled)
#[cfg(feature = "database")]
pub mod database;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

pub use auth::{Principal, TokenIssuer};
pub use error::{PlannerError, PlannerResult};
pub use store::{InMemoryStore, PlannerStore};

#[cfg(feature = "database")]
pub use database::{DatabaseConfig, DatabaseManager, PgStore};
