//! Person repository: profiles created and refreshed by Slack sign-in

use sqlx::PgPool;

use super::map_db_error;
use crate::error::PlannerError;
use crate::models::{NewPerson, Person, ProfileUpdate};

const PERSON_COLUMNS: &str = "id, slack_id, slack_firstname, slack_lastname, slack_photo_link, \
                              slack_title, slack_email, is_admin, created_at";

#[derive(Clone)]
pub struct PersonRepository {
    pool: PgPool,
}

impl PersonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_person(&self, person: &NewPerson) -> Result<Person, PlannerError> {
        let query = format!(
            r#"INSERT INTO person (
                   slack_id, slack_photo_link, slack_firstname, slack_lastname,
                   slack_title, slack_email
               ) VALUES ($1, $2, $3, $4, $5, lower($6))
               RETURNING {PERSON_COLUMNS}"#
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(&person.slack_id)
            .bind(&person.slack_photo_link)
            .bind(&person.slack_firstname)
            .bind(&person.slack_lastname)
            .bind(&person.slack_title)
            .bind(&person.slack_email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(&format!("person {}", person.slack_email), e))
    }

    pub async fn update_person(
        &self,
        id: i32,
        update: &ProfileUpdate,
    ) -> Result<Option<Person>, PlannerError> {
        let query = format!(
            r#"UPDATE person
               SET slack_firstname = $2, slack_lastname = $3, slack_photo_link = $4
               WHERE id = $1
               RETURNING {PERSON_COLUMNS}"#
        );
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(&update.slack_firstname)
            .bind(&update.slack_lastname)
            .bind(&update.slack_photo_link)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    pub async fn update_title(&self, id: i32, title: &str) -> Result<Option<Person>, PlannerError> {
        let query = format!(
            "UPDATE person SET slack_title = $2 WHERE id = $1 RETURNING {PERSON_COLUMNS}"
        );
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    pub async fn set_admin(&self, id: i32, is_admin: bool) -> Result<bool, PlannerError> {
        let result = sqlx::query("UPDATE person SET is_admin = $2 WHERE id = $1")
            .bind(id)
            .bind(is_admin)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_person(&self, id: i32) -> Result<Option<Person>, PlannerError> {
        let query = format!("SELECT {PERSON_COLUMNS} FROM person WHERE id = $1");
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    pub async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, PlannerError> {
        let query = format!(
            "SELECT {PERSON_COLUMNS} FROM person WHERE lower(slack_email) = lower($1)"
        );
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    pub async fn find_person_by_slack_id(
        &self,
        slack_id: &str,
    ) -> Result<Option<Person>, PlannerError> {
        let query = format!("SELECT {PERSON_COLUMNS} FROM person WHERE slack_id = $1");
        let person = sqlx::query_as::<_, Person>(&query)
            .bind(slack_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    pub async fn update_slack_identity(
        &self,
        id: i32,
        slack_id: &str,
        email: &str,
    ) -> Result<Option<Person>, PlannerError> {
        let query = format!(
            r#"UPDATE person
               SET slack_id = $2, slack_email = lower($3)
               WHERE id = $1
               RETURNING {PERSON_COLUMNS}"#
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(slack_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(&format!("person {email}"), e))
    }

    pub async fn list_people(&self) -> Result<Vec<Person>, PlannerError> {
        let query = format!(
            "SELECT {PERSON_COLUMNS} FROM person ORDER BY slack_lastname, slack_firstname, id"
        );
        let people = sqlx::query_as::<_, Person>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(people)
    }
}
