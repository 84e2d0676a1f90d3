//! PlannerStore: the persistence port behind every route.
//!
//! Handlers hold an `Arc<dyn PlannerStore>` so the same routes run against
//! PostgreSQL (`database::PgStore`) or the in-memory store used by tests and
//! the `--in-memory` development mode.

use async_trait::async_trait;

use crate::error::PlannerError;
use crate::models::{
    Attendee, City, Cohort, Module, NewPerson, NewRole, NewSession, Person, ProfileUpdate, Role,
    Session, SessionFilter, SignUp, SignUpDetail,
};

pub mod memory;

pub use memory::InMemoryStore;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[async_trait]
pub trait PlannerStore: Send + Sync {
    // ── Sessions ──────────────────────────────────────────────

    /// Sessions matching `filter`, ordered by date, start time, id.
    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>>;

    async fn get_session(&self, id: i32) -> Result<Option<Session>>;

    /// Unknown cohort or module is `InvalidInput`.
    async fn create_session(&self, session: &NewSession) -> Result<Session>;

    async fn update_session(&self, id: i32, session: &NewSession) -> Result<Option<Session>>;

    /// Removes the session and every sign-up for it.
    async fn delete_session(&self, id: i32) -> Result<bool>;

    // ── Sign-ups ──────────────────────────────────────────────

    /// One row per (session, person): signing up again replaces the role.
    async fn insert_sign_up(&self, session_id: i32, role_id: i32, person_id: i32)
        -> Result<SignUp>;

    /// `false` when the person was not signed up.
    async fn cancel_sign_up(&self, session_id: i32, person_id: i32) -> Result<bool>;

    /// Ordered by role name, then last name.
    async fn list_attendees(&self, session_id: i32) -> Result<Vec<Attendee>>;

    /// A person's sign-ups, optionally narrowed to one session.
    async fn sign_up_details(
        &self,
        person_id: i32,
        session_id: Option<i32>,
    ) -> Result<Vec<SignUpDetail>>;

    // ── People ────────────────────────────────────────────────

    /// Duplicate email or Slack id is `Conflict`.
    async fn create_person(&self, person: &NewPerson) -> Result<Person>;

    async fn update_person(&self, id: i32, update: &ProfileUpdate) -> Result<Option<Person>>;

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Person>>;

    async fn get_person(&self, id: i32) -> Result<Option<Person>>;

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>>;

    async fn find_person_by_slack_id(&self, slack_id: &str) -> Result<Option<Person>>;

    /// Re-links a person to their Slack account after the email or user id
    /// changed on the Slack side. Taken email or Slack id is `Conflict`.
    async fn update_slack_identity(
        &self,
        id: i32,
        slack_id: &str,
        email: &str,
    ) -> Result<Option<Person>>;

    async fn list_people(&self) -> Result<Vec<Person>>;

    // ── Reference data ────────────────────────────────────────

    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Duplicate name (case-insensitive) is `Conflict`.
    async fn create_role(&self, role: &NewRole) -> Result<Role>;

    async fn list_cities(&self) -> Result<Vec<City>>;

    async fn list_cohorts(&self, city: Option<&str>) -> Result<Vec<Cohort>>;

    async fn list_modules(&self) -> Result<Vec<Module>>;

    /// Backend liveness check.
    async fn health(&self) -> Result<()>;
}
