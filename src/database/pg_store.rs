//! Postgres implementation of the PlannerStore port.
//!
//! Each repository is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{AttendanceRepository, PersonRepository, ReferenceRepository, SessionRepository};
use crate::models::{
    Attendee, City, Cohort, Module, NewPerson, NewRole, NewSession, Person, ProfileUpdate, Role,
    Session, SessionFilter, SignUp, SignUpDetail,
};
use crate::store::{PlannerStore, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    pub sessions: SessionRepository,
    pub attendance: AttendanceRepository,
    pub people: PersonRepository,
    pub reference: ReferenceRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            sessions: SessionRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            people: PersonRepository::new(pool.clone()),
            reference: ReferenceRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl PlannerStore for PgStore {
    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        self.sessions.list_sessions(filter).await
    }

    async fn get_session(&self, id: i32) -> Result<Option<Session>> {
        self.sessions.get_session(id).await
    }

    async fn create_session(&self, session: &NewSession) -> Result<Session> {
        self.sessions.create_session(session).await
    }

    async fn update_session(&self, id: i32, session: &NewSession) -> Result<Option<Session>> {
        self.sessions.update_session(id, session).await
    }

    async fn delete_session(&self, id: i32) -> Result<bool> {
        self.sessions.delete_session(id).await
    }

    async fn insert_sign_up(
        &self,
        session_id: i32,
        role_id: i32,
        person_id: i32,
    ) -> Result<SignUp> {
        self.attendance
            .insert_sign_up(session_id, role_id, person_id)
            .await
    }

    async fn cancel_sign_up(&self, session_id: i32, person_id: i32) -> Result<bool> {
        self.attendance.cancel_sign_up(session_id, person_id).await
    }

    async fn list_attendees(&self, session_id: i32) -> Result<Vec<Attendee>> {
        self.attendance.list_attendees(session_id).await
    }

    async fn sign_up_details(
        &self,
        person_id: i32,
        session_id: Option<i32>,
    ) -> Result<Vec<SignUpDetail>> {
        self.attendance.sign_up_details(person_id, session_id).await
    }

    async fn create_person(&self, person: &NewPerson) -> Result<Person> {
        self.people.create_person(person).await
    }

    async fn update_person(&self, id: i32, update: &ProfileUpdate) -> Result<Option<Person>> {
        self.people.update_person(id, update).await
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Person>> {
        self.people.update_title(id, title).await
    }

    async fn get_person(&self, id: i32) -> Result<Option<Person>> {
        self.people.get_person(id).await
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        self.people.find_person_by_email(email).await
    }

    async fn find_person_by_slack_id(&self, slack_id: &str) -> Result<Option<Person>> {
        self.people.find_person_by_slack_id(slack_id).await
    }

    async fn update_slack_identity(
        &self,
        id: i32,
        slack_id: &str,
        email: &str,
    ) -> Result<Option<Person>> {
        self.people.update_slack_identity(id, slack_id, email).await
    }

    async fn list_people(&self) -> Result<Vec<Person>> {
        self.people.list_people().await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.reference.list_roles().await
    }

    async fn create_role(&self, role: &NewRole) -> Result<Role> {
        self.reference.create_role(role).await
    }

    async fn list_cities(&self) -> Result<Vec<City>> {
        self.reference.list_cities().await
    }

    async fn list_cohorts(&self, city: Option<&str>) -> Result<Vec<Cohort>> {
        self.reference.list_cohorts(city).await
    }

    async fn list_modules(&self) -> Result<Vec<Module>> {
        self.reference.list_modules().await
    }

    async fn health(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
