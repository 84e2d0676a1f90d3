//! Session repository: scheduled classes joined with cohort, city and module

use sqlx::PgPool;

use super::map_db_error;
use crate::error::PlannerError;
use crate::models::{NewSession, Session, SessionFilter};

const SESSION_VIEW: &str = r#"
    SELECT s.id, s.date, s.time_start, s.time_end, s.who_leading,
           ci.name AS city, co.name AS cohort, s.cohort_id, s.location,
           m.name AS module_name, s.module_id, s.module_week,
           m.syllabus_link, s.meeting_link
    FROM session s
      JOIN cohort co ON co.id = s.cohort_id
      JOIN city ci ON ci.id = co.city_id
      JOIN module m ON m.id = s.module_id
"#;

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List sessions with optional filtering
    ///
    /// Every filter is bound positionally and disabled by a NULL parameter,
    /// so the statement text never changes.
    pub async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, PlannerError> {
        let query = format!(
            r#"{SESSION_VIEW}
            WHERE ($1::text[] IS NULL OR lower(ci.name) = ANY($1))
              AND ($2::int IS NULL OR s.cohort_id = $2)
              AND ($3::int IS NULL OR s.module_id = $3)
              AND ($4::date IS NULL OR s.date >= $4)
              AND ($5::date IS NULL OR s.date <= $5)
              AND ($6::text IS NULL
                   OR lower(m.name) LIKE $6
                   OR lower(ci.name) LIKE $6
                   OR lower(co.name) LIKE $6
                   OR lower(coalesce(s.location, '')) LIKE $6
                   OR lower(s.who_leading) LIKE $6)
            ORDER BY s.date, s.time_start, s.id"#
        );

        let cities: Option<Vec<String>> = if filter.cities.is_empty() {
            None
        } else {
            Some(filter.cities.iter().map(|c| c.to_lowercase()).collect())
        };
        let pattern = filter.search_term().map(|term| format!("%{}%", escape_like(&term)));

        let sessions = sqlx::query_as::<_, Session>(&query)
            .bind(cities)
            .bind(filter.cohort_id)
            .bind(filter.module_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    pub async fn get_session(&self, id: i32) -> Result<Option<Session>, PlannerError> {
        let query = format!("{SESSION_VIEW} WHERE s.id = $1");
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    pub async fn create_session(&self, session: &NewSession) -> Result<Session, PlannerError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO session (
                   date, time_start, time_end, who_leading, cohort_id,
                   module_id, module_week, location, meeting_link
               ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id"#,
        )
        .bind(session.date)
        .bind(session.time_start)
        .bind(session.time_end)
        .bind(&session.who_leading)
        .bind(session.cohort_id)
        .bind(session.module_id)
        .bind(session.module_week)
        .bind(&session.location)
        .bind(&session.meeting_link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("session", e))?;

        self.get_session(id)
            .await?
            .ok_or_else(|| PlannerError::not_found("session", id))
    }

    pub async fn update_session(
        &self,
        id: i32,
        session: &NewSession,
    ) -> Result<Option<Session>, PlannerError> {
        let updated = sqlx::query_scalar::<_, i32>(
            r#"UPDATE session
               SET date = $2, time_start = $3, time_end = $4, who_leading = $5,
                   cohort_id = $6, module_id = $7, module_week = $8,
                   location = $9, meeting_link = $10
               WHERE id = $1
               RETURNING id"#,
        )
        .bind(id)
        .bind(session.date)
        .bind(session.time_start)
        .bind(session.time_end)
        .bind(&session.who_leading)
        .bind(session.cohort_id)
        .bind(session.module_id)
        .bind(session.module_week)
        .bind(&session.location)
        .bind(&session.meeting_link)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("session", e))?;

        match updated {
            Some(id) => self.get_session(id).await,
            None => Ok(None),
        }
    }

    /// Attendance rows go with the session (ON DELETE CASCADE).
    pub async fn delete_session(&self, id: i32) -> Result<bool, PlannerError> {
        let result = sqlx::query("DELETE FROM session WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
