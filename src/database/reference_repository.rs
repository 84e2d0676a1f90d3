//! Reference data: roles, cities, cohorts and modules

use sqlx::PgPool;

use super::map_db_error;
use crate::error::PlannerError;
use crate::models::{City, Cohort, Module, NewRole, Role};

#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, PlannerError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, description FROM role ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn create_role(&self, role: &NewRole) -> Result<Role, PlannerError> {
        sqlx::query_as::<_, Role>(
            r#"INSERT INTO role (name, description)
               VALUES ($1, $2)
               RETURNING id, name, description"#,
        )
        .bind(&role.name)
        .bind(&role.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(&format!("role '{}'", role.name), e))
    }

    pub async fn list_cities(&self) -> Result<Vec<City>, PlannerError> {
        let cities = sqlx::query_as::<_, City>("SELECT id, name FROM city ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(cities)
    }

    pub async fn create_city(&self, name: &str) -> Result<City, PlannerError> {
        sqlx::query_as::<_, City>(
            r#"INSERT INTO city (name) VALUES ($1)
               ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
               RETURNING id, name"#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(&format!("city '{name}'"), e))
    }

    pub async fn list_cohorts(&self, city: Option<&str>) -> Result<Vec<Cohort>, PlannerError> {
        let cohorts = sqlx::query_as::<_, Cohort>(
            r#"SELECT co.id, co.name, co.city_id, ci.name AS city
               FROM cohort co
                 JOIN city ci ON ci.id = co.city_id
               WHERE ($1::text IS NULL OR lower(ci.name) = lower($1))
               ORDER BY ci.name, co.name"#,
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await?;
        Ok(cohorts)
    }

    pub async fn create_cohort(&self, name: &str, city_id: i32) -> Result<Cohort, PlannerError> {
        sqlx::query_as::<_, Cohort>(
            r#"WITH inserted AS (
                   INSERT INTO cohort (name, city_id) VALUES ($1, $2)
                   ON CONFLICT (city_id, name) DO UPDATE SET name = EXCLUDED.name
                   RETURNING id, name, city_id
               )
               SELECT i.id, i.name, i.city_id, ci.name AS city
               FROM inserted i JOIN city ci ON ci.id = i.city_id"#,
        )
        .bind(name)
        .bind(city_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(&format!("cohort '{name}'"), e))
    }

    pub async fn list_modules(&self) -> Result<Vec<Module>, PlannerError> {
        let modules =
            sqlx::query_as::<_, Module>("SELECT id, name, syllabus_link FROM module ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(modules)
    }

    pub async fn create_module(
        &self,
        name: &str,
        syllabus_link: Option<&str>,
    ) -> Result<Module, PlannerError> {
        sqlx::query_as::<_, Module>(
            r#"INSERT INTO module (name, syllabus_link) VALUES ($1, $2)
               ON CONFLICT (name) DO UPDATE SET syllabus_link = EXCLUDED.syllabus_link
               RETURNING id, name, syllabus_link"#,
        )
        .bind(name)
        .bind(syllabus_link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(&format!("module '{name}'"), e))
    }
}
