//! In-memory PlannerStore
//!
//! Mirrors the PostgreSQL schema with ordered maps behind a single
//! `RwLock`, so every operation sees a consistent snapshot the way one SQL
//! statement would.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{PlannerStore, Result};
use crate::error::PlannerError;
use crate::models::reference::DEFAULT_ROLES;
use crate::models::{
    Attendee, City, Cohort, Module, NewPerson, NewRole, NewSession, Person, ProfileUpdate, Role,
    Session, SessionFilter, SignUp, SignUpDetail,
};

#[derive(Debug, Clone)]
struct CohortRow {
    name: String,
    city_id: i32,
}

#[derive(Debug, Default)]
struct Tables {
    cities: BTreeMap<i32, String>,
    cohorts: BTreeMap<i32, CohortRow>,
    modules: BTreeMap<i32, Module>,
    roles: BTreeMap<i32, Role>,
    people: BTreeMap<i32, Person>,
    sessions: BTreeMap<i32, NewSession>,
    attendance: BTreeMap<i32, SignUp>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn session_view(&self, id: i32, row: &NewSession) -> Option<Session> {
        let cohort = self.cohorts.get(&row.cohort_id)?;
        let city = self.cities.get(&cohort.city_id)?;
        let module = self.modules.get(&row.module_id)?;
        Some(Session {
            id,
            date: row.date,
            time_start: row.time_start,
            time_end: row.time_end,
            who_leading: row.who_leading.clone(),
            city: city.clone(),
            cohort: cohort.name.clone(),
            cohort_id: row.cohort_id,
            location: row.location.clone(),
            module_name: module.name.clone(),
            module_id: row.module_id,
            module_week: row.module_week,
            syllabus_link: module.syllabus_link.clone(),
            meeting_link: row.meeting_link.clone(),
        })
    }

    fn check_references(&self, session: &NewSession) -> Result<()> {
        if !self.cohorts.contains_key(&session.cohort_id) {
            return Err(PlannerError::invalid(format!(
                "cohort {} does not exist",
                session.cohort_id
            )));
        }
        if !self.modules.contains_key(&session.module_id) {
            return Err(PlannerError::invalid(format!(
                "module {} does not exist",
                session.module_id
            )));
        }
        Ok(())
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.people
            .values()
            .any(|p| Some(p.id) != except && p.slack_email.eq_ignore_ascii_case(email))
    }

    fn slack_id_taken(&self, slack_id: &str, except: Option<i32>) -> bool {
        self.people
            .values()
            .any(|p| Some(p.id) != except && p.slack_id.as_deref() == Some(slack_id))
    }
}

/// PlannerStore backed by process memory
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store with the default session roles.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (name, description) in DEFAULT_ROLES {
            let id = tables.next_id();
            tables.roles.insert(
                id,
                Role {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
            );
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Store with a couple of cities, cohorts, modules and sessions, for
    /// running the server without a database.
    pub async fn with_demo_data() -> Result<Self> {
        let store = Self::new();
        let london = store.add_city("London").await;
        let manchester = store.add_city("Manchester").await;
        let ldn = store.add_cohort("LDN-10", london.id).await?;
        let nw = store.add_cohort("NW-6", manchester.id).await?;
        let js = store
            .add_module(
                "JavaScript Core",
                Some("https://syllabus.codeyourfuture.io/js-core-1"),
            )
            .await;
        let react = store
            .add_module("React", Some("https://syllabus.codeyourfuture.io/react"))
            .await;

        let demo = [
            (ldn.id, js.id, 1, (2023, 12, 9), "Anna"),
            (ldn.id, js.id, 2, (2023, 12, 16), "Saim"),
            (nw.id, react.id, 1, (2023, 12, 10), "Baki"),
        ];
        for (cohort_id, module_id, week, (y, m, d), leader) in demo {
            store
                .create_session(&NewSession {
                    date: NaiveDate::from_ymd_opt(y, m, d)
                        .ok_or_else(|| PlannerError::invalid("demo date"))?,
                    time_start: NaiveTime::from_hms_opt(10, 0, 0)
                        .ok_or_else(|| PlannerError::invalid("demo time"))?,
                    time_end: NaiveTime::from_hms_opt(17, 0, 0)
                        .ok_or_else(|| PlannerError::invalid("demo time"))?,
                    who_leading: leader.to_string(),
                    cohort_id,
                    module_id,
                    module_week: week,
                    location: Some("Community hall".to_string()),
                    meeting_link: None,
                })
                .await?;
        }
        Ok(store)
    }

    pub async fn add_city(&self, name: &str) -> City {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        t.cities.insert(id, name.to_string());
        City {
            id,
            name: name.to_string(),
        }
    }

    pub async fn add_cohort(&self, name: &str, city_id: i32) -> Result<Cohort> {
        let mut t = self.tables.write().await;
        let city = t
            .cities
            .get(&city_id)
            .cloned()
            .ok_or_else(|| PlannerError::not_found("city", city_id))?;
        let id = t.next_id();
        t.cohorts.insert(
            id,
            CohortRow {
                name: name.to_string(),
                city_id,
            },
        );
        Ok(Cohort {
            id,
            name: name.to_string(),
            city_id,
            city,
        })
    }

    pub async fn add_module(&self, name: &str, syllabus_link: Option<&str>) -> Module {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let module = Module {
            id,
            name: name.to_string(),
            syllabus_link: syllabus_link.map(str::to_string),
        };
        t.modules.insert(id, module.clone());
        module
    }

    /// Grant or revoke admin rights; there is no route for this.
    pub async fn set_admin(&self, person_id: i32, is_admin: bool) -> Result<()> {
        let mut t = self.tables.write().await;
        let person = t
            .people
            .get_mut(&person_id)
            .ok_or_else(|| PlannerError::not_found("person", person_id))?;
        person.is_admin = is_admin;
        Ok(())
    }
}

#[async_trait]
impl PlannerStore for InMemoryStore {
    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        let t = self.tables.read().await;
        let mut sessions: Vec<Session> = t
            .sessions
            .iter()
            .filter_map(|(id, row)| t.session_view(*id, row))
            .filter(|s| filter.matches(s))
            .collect();
        sessions.sort_by(|a, b| (a.date, a.time_start, a.id).cmp(&(b.date, b.time_start, b.id)));
        Ok(sessions)
    }

    async fn get_session(&self, id: i32) -> Result<Option<Session>> {
        let t = self.tables.read().await;
        Ok(t.sessions.get(&id).and_then(|row| t.session_view(id, row)))
    }

    async fn create_session(&self, session: &NewSession) -> Result<Session> {
        let mut t = self.tables.write().await;
        t.check_references(session)?;
        let id = t.next_id();
        t.sessions.insert(id, session.clone());
        debug!(session_id = id, "created session");
        t.session_view(id, session)
            .ok_or_else(|| PlannerError::Internal(anyhow::anyhow!("session {id} has no view")))
    }

    async fn update_session(&self, id: i32, session: &NewSession) -> Result<Option<Session>> {
        let mut t = self.tables.write().await;
        if !t.sessions.contains_key(&id) {
            return Ok(None);
        }
        t.check_references(session)?;
        t.sessions.insert(id, session.clone());
        Ok(t.session_view(id, session))
    }

    async fn delete_session(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        t.attendance.retain(|_, a| a.session_id != id);
        Ok(true)
    }

    async fn insert_sign_up(
        &self,
        session_id: i32,
        role_id: i32,
        person_id: i32,
    ) -> Result<SignUp> {
        let mut t = self.tables.write().await;
        if !t.sessions.contains_key(&session_id) {
            return Err(PlannerError::not_found("session", session_id));
        }
        if !t.people.contains_key(&person_id) {
            return Err(PlannerError::not_found("person", person_id));
        }
        if !t.roles.contains_key(&role_id) {
            return Err(PlannerError::not_found("role", role_id));
        }

        if let Some(existing) = t
            .attendance
            .values_mut()
            .find(|a| a.session_id == session_id && a.person_id == person_id)
        {
            existing.role_id = role_id;
            return Ok(existing.clone());
        }

        let id = t.next_id();
        let sign_up = SignUp {
            id,
            session_id,
            person_id,
            role_id,
        };
        t.attendance.insert(id, sign_up.clone());
        Ok(sign_up)
    }

    async fn cancel_sign_up(&self, session_id: i32, person_id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.attendance.len();
        t.attendance
            .retain(|_, a| !(a.session_id == session_id && a.person_id == person_id));
        Ok(t.attendance.len() < before)
    }

    async fn list_attendees(&self, session_id: i32) -> Result<Vec<Attendee>> {
        let t = self.tables.read().await;
        let mut attendees: Vec<Attendee> = t
            .attendance
            .values()
            .filter(|a| a.session_id == session_id)
            .filter_map(|a| {
                let person = t.people.get(&a.person_id)?;
                let role = t.roles.get(&a.role_id)?;
                Some(Attendee {
                    person_id: person.id,
                    slack_firstname: person.slack_firstname.clone(),
                    slack_lastname: person.slack_lastname.clone(),
                    slack_photo_link: person.slack_photo_link.clone(),
                    role_id: role.id,
                    role: role.name.clone(),
                })
            })
            .collect();
        attendees.sort_by(|a, b| {
            (&a.role, &a.slack_lastname, a.person_id).cmp(&(&b.role, &b.slack_lastname, b.person_id))
        });
        Ok(attendees)
    }

    async fn sign_up_details(
        &self,
        person_id: i32,
        session_id: Option<i32>,
    ) -> Result<Vec<SignUpDetail>> {
        let t = self.tables.read().await;
        let mut details: Vec<SignUpDetail> = t
            .attendance
            .values()
            .filter(|a| a.person_id == person_id)
            .filter(|a| session_id.map_or(true, |id| a.session_id == id))
            .filter_map(|a| {
                let person = t.people.get(&a.person_id)?;
                let role = t.roles.get(&a.role_id)?;
                let row = t.sessions.get(&a.session_id)?;
                let module = t.modules.get(&row.module_id)?;
                Some(SignUpDetail {
                    session_id: a.session_id,
                    slack_firstname: person.slack_firstname.clone(),
                    slack_lastname: person.slack_lastname.clone(),
                    name: role.name.clone(),
                    meeting_link: row.meeting_link.clone(),
                    date: row.date,
                    time_start: row.time_start,
                    time_end: row.time_end,
                    module_name: module.name.clone(),
                })
            })
            .collect();
        details.sort_by(|a, b| (a.date, a.time_start, a.session_id).cmp(&(b.date, b.time_start, b.session_id)));
        Ok(details)
    }

    async fn create_person(&self, person: &NewPerson) -> Result<Person> {
        let mut t = self.tables.write().await;
        if t.email_taken(&person.slack_email, None) {
            return Err(PlannerError::Conflict(format!(
                "a person with email {} already exists",
                person.slack_email
            )));
        }
        if let Some(slack_id) = person.slack_id.as_deref() {
            if t.slack_id_taken(slack_id, None) {
                return Err(PlannerError::Conflict(format!(
                    "a person with Slack id {slack_id} already exists"
                )));
            }
        }
        let id = t.next_id();
        let created = Person {
            id,
            slack_id: person.slack_id.clone(),
            slack_firstname: person.slack_firstname.clone(),
            slack_lastname: person.slack_lastname.clone(),
            slack_photo_link: person.slack_photo_link.clone(),
            slack_title: person.slack_title.clone(),
            slack_email: person.slack_email.to_lowercase(),
            is_admin: false,
            created_at: Utc::now(),
        };
        t.people.insert(id, created.clone());
        Ok(created)
    }

    async fn update_person(&self, id: i32, update: &ProfileUpdate) -> Result<Option<Person>> {
        let mut t = self.tables.write().await;
        Ok(t.people.get_mut(&id).map(|person| {
            person.slack_firstname = update.slack_firstname.clone();
            person.slack_lastname = update.slack_lastname.clone();
            person.slack_photo_link = update.slack_photo_link.clone();
            person.clone()
        }))
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Person>> {
        let mut t = self.tables.write().await;
        Ok(t.people.get_mut(&id).map(|person| {
            person.slack_title = title.to_string();
            person.clone()
        }))
    }

    async fn get_person(&self, id: i32) -> Result<Option<Person>> {
        Ok(self.tables.read().await.people.get(&id).cloned())
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        let t = self.tables.read().await;
        Ok(t.people
            .values()
            .find(|p| p.slack_email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn find_person_by_slack_id(&self, slack_id: &str) -> Result<Option<Person>> {
        let t = self.tables.read().await;
        Ok(t.people
            .values()
            .find(|p| p.slack_id.as_deref() == Some(slack_id))
            .cloned())
    }

    async fn update_slack_identity(
        &self,
        id: i32,
        slack_id: &str,
        email: &str,
    ) -> Result<Option<Person>> {
        let mut t = self.tables.write().await;
        if !t.people.contains_key(&id) {
            return Ok(None);
        }
        if t.email_taken(email, Some(id)) {
            return Err(PlannerError::Conflict(format!(
                "a person with email {email} already exists"
            )));
        }
        if t.slack_id_taken(slack_id, Some(id)) {
            return Err(PlannerError::Conflict(format!(
                "a person with Slack id {slack_id} already exists"
            )));
        }
        Ok(t.people.get_mut(&id).map(|person| {
            person.slack_id = Some(slack_id.to_string());
            person.slack_email = email.to_lowercase();
            person.clone()
        }))
    }

    async fn list_people(&self) -> Result<Vec<Person>> {
        let t = self.tables.read().await;
        let mut people: Vec<Person> = t.people.values().cloned().collect();
        people.sort_by(|a, b| {
            (&a.slack_lastname, &a.slack_firstname, a.id).cmp(&(&b.slack_lastname, &b.slack_firstname, b.id))
        });
        Ok(people)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let t = self.tables.read().await;
        let mut roles: Vec<Role> = t.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn create_role(&self, role: &NewRole) -> Result<Role> {
        let mut t = self.tables.write().await;
        if t.roles.values().any(|r| r.name.eq_ignore_ascii_case(&role.name)) {
            return Err(PlannerError::Conflict(format!(
                "role '{}' already exists",
                role.name
            )));
        }
        let id = t.next_id();
        let created = Role {
            id,
            name: role.name.clone(),
            description: role.description.clone(),
        };
        t.roles.insert(id, created.clone());
        Ok(created)
    }

    async fn list_cities(&self) -> Result<Vec<City>> {
        let t = self.tables.read().await;
        let mut cities: Vec<City> = t
            .cities
            .iter()
            .map(|(id, name)| City {
                id: *id,
                name: name.clone(),
            })
            .collect();
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cities)
    }

    async fn list_cohorts(&self, city: Option<&str>) -> Result<Vec<Cohort>> {
        let t = self.tables.read().await;
        let mut cohorts: Vec<Cohort> = t
            .cohorts
            .iter()
            .filter_map(|(id, row)| {
                let city_name = t.cities.get(&row.city_id)?;
                Some(Cohort {
                    id: *id,
                    name: row.name.clone(),
                    city_id: row.city_id,
                    city: city_name.clone(),
                })
            })
            .filter(|c| city.map_or(true, |name| c.city.eq_ignore_ascii_case(name)))
            .collect();
        cohorts.sort_by(|a, b| (&a.city, &a.name).cmp(&(&b.city, &b.name)));
        Ok(cohorts)
    }

    async fn list_modules(&self) -> Result<Vec<Module>> {
        let t = self.tables.read().await;
        let mut modules: Vec<Module> = t.modules.values().cloned().collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(modules)
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryStore, Session, Person) {
        let store = InMemoryStore::new();
        let city = store.add_city("London").await;
        let cohort = store.add_cohort("LDN-10", city.id).await.unwrap();
        let module = store.add_module("React", None).await;
        let session = store
            .create_session(&NewSession {
                date: NaiveDate::from_ymd_opt(2023, 12, 11).unwrap(),
                time_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                time_end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                who_leading: "John Doe".into(),
                cohort_id: cohort.id,
                module_id: module.id,
                module_week: 1,
                location: None,
                meeting_link: Some("https://meet.example.com/x".into()),
            })
            .await
            .unwrap();
        let person = store
            .create_person(&NewPerson {
                slack_id: None,
                slack_photo_link: None,
                slack_firstname: "Anna".into(),
                slack_lastname: "Smith".into(),
                slack_title: "Volunteer".into(),
                slack_email: "anna@example.com".into(),
            })
            .await
            .unwrap();
        (store, session, person)
    }

    #[tokio::test]
    async fn test_sign_up_replaces_role() {
        let (store, session, person) = seeded().await;
        let roles = store.list_roles().await.unwrap();

        let first = store
            .insert_sign_up(session.id, roles[0].id, person.id)
            .await
            .unwrap();
        let second = store
            .insert_sign_up(session.id, roles[1].id, person.id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let attendees = store.list_attendees(session.id).await.unwrap();
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].role_id, roles[1].id);
    }

    #[tokio::test]
    async fn test_cancel_sign_up_is_idempotent() {
        let (store, session, person) = seeded().await;
        let role = store.list_roles().await.unwrap()[0].id;
        store.insert_sign_up(session.id, role, person.id).await.unwrap();

        assert!(store.cancel_sign_up(session.id, person.id).await.unwrap());
        assert!(!store.cancel_sign_up(session.id, person.id).await.unwrap());
        assert!(store.list_attendees(session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_session_cascades_attendance() {
        let (store, session, person) = seeded().await;
        let role = store.list_roles().await.unwrap()[0].id;
        store.insert_sign_up(session.id, role, person.id).await.unwrap();

        assert!(store.delete_session(session.id).await.unwrap());
        assert!(store
            .sign_up_details(person.id, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_details_joins_role_and_link() {
        let (store, session, person) = seeded().await;
        let role = store.list_roles().await.unwrap()[0].clone();
        store.insert_sign_up(session.id, role.id, person.id).await.unwrap();

        let details = store
            .sign_up_details(person.id, Some(session.id))
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].name, role.name);
        assert_eq!(details[0].slack_firstname, "Anna");
        assert_eq!(
            details[0].meeting_link.as_deref(),
            Some("https://meet.example.com/x")
        );
        assert!(store
            .sign_up_details(person.id, Some(session.id + 100))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let (store, session, person) = seeded().await;
        let err = store.insert_sign_up(session.id, 9999, person.id).await;
        assert!(matches!(err, Err(PlannerError::NotFound(_))));

        let mut bad = NewSession {
            date: session.date,
            time_start: session.time_start,
            time_end: session.time_end,
            who_leading: "x".into(),
            cohort_id: 9999,
            module_id: session.module_id,
            module_week: 1,
            location: None,
            meeting_link: None,
        };
        assert!(matches!(
            store.create_session(&bad).await,
            Err(PlannerError::InvalidInput(_))
        ));
        bad.cohort_id = session.cohort_id;
        bad.module_id = 9999;
        assert!(store.create_session(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_and_role_conflict() {
        let (store, _, _) = seeded().await;
        let dup = NewPerson {
            slack_id: None,
            slack_photo_link: None,
            slack_firstname: "Other".into(),
            slack_lastname: "Anna".into(),
            slack_title: String::new(),
            slack_email: "ANNA@example.com".into(),
        };
        assert!(matches!(
            store.create_person(&dup).await,
            Err(PlannerError::Conflict(_))
        ));

        let role = NewRole {
            name: "lead teacher".into(),
            description: None,
        };
        assert!(matches!(
            store.create_role(&role).await,
            Err(PlannerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slack_id_conflicts() {
        let (store, _, anna) = seeded().await;
        let slack_user = |email: &str| NewPerson {
            slack_id: Some("U1".into()),
            slack_photo_link: None,
            slack_firstname: "Baki".into(),
            slack_lastname: "Yilmaz".into(),
            slack_title: String::new(),
            slack_email: email.into(),
        };
        let baki = store.create_person(&slack_user("old@x.org")).await.unwrap();
        assert!(matches!(
            store.create_person(&slack_user("new@x.org")).await,
            Err(PlannerError::Conflict(_))
        ));

        // Re-linking cannot steal another person's Slack id or email.
        assert!(matches!(
            store.update_slack_identity(anna.id, "U1", "anna@example.com").await,
            Err(PlannerError::Conflict(_))
        ));
        assert!(matches!(
            store.update_slack_identity(baki.id, "U1", "anna@example.com").await,
            Err(PlannerError::Conflict(_))
        ));

        let moved = store
            .update_slack_identity(baki.id, "U1", "New@X.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.slack_email, "new@x.org");
        assert!(store.update_slack_identity(999, "U9", "x@x.org").await.unwrap().is_none());
        assert_eq!(store.list_people().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_demo_data_lists_in_date_order() {
        let store = InMemoryStore::with_demo_data().await.unwrap();
        let sessions = store.list_sessions(&SessionFilter::default()).await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(sessions.windows(2).all(|w| w[0].date <= w[1].date));

        let manchester = SessionFilter {
            cities: vec!["manchester".into()],
            ..Default::default()
        };
        let only = store.list_sessions(&manchester).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].module_name, "React");

        let cohorts = store.list_cohorts(Some("London")).await.unwrap();
        assert_eq!(cohorts.len(), 1);
        assert_eq!(cohorts[0].name, "LDN-10");
    }
}
