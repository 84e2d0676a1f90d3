//! Attendance repository: sign-ups of people to sessions in a role

use sqlx::PgPool;

use super::map_db_error;
use crate::error::PlannerError;
use crate::models::{Attendee, SignUp, SignUpDetail};

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sign a person up for a session; an existing sign-up takes the new role.
    pub async fn insert_sign_up(
        &self,
        session_id: i32,
        role_id: i32,
        person_id: i32,
    ) -> Result<SignUp, PlannerError> {
        sqlx::query_as::<_, SignUp>(
            r#"INSERT INTO attendance (session_id, person_id, role_id)
               VALUES ($1, $2, $3)
               ON CONFLICT (session_id, person_id) DO UPDATE SET role_id = EXCLUDED.role_id
               RETURNING id, session_id, person_id, role_id"#,
        )
        .bind(session_id)
        .bind(person_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .map(str::to_string);
            match constraint.as_deref() {
                Some("attendance_session_id_fkey") => PlannerError::not_found("session", session_id),
                Some("attendance_person_id_fkey") => PlannerError::not_found("person", person_id),
                Some("attendance_role_id_fkey") => PlannerError::not_found("role", role_id),
                _ => map_db_error("sign-up", e),
            }
        })
    }

    pub async fn cancel_sign_up(&self, session_id: i32, person_id: i32) -> Result<bool, PlannerError> {
        let result = sqlx::query("DELETE FROM attendance WHERE session_id = $1 AND person_id = $2")
            .bind(session_id)
            .bind(person_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_attendees(&self, session_id: i32) -> Result<Vec<Attendee>, PlannerError> {
        let attendees = sqlx::query_as::<_, Attendee>(
            r#"SELECT p.id AS person_id, p.slack_firstname, p.slack_lastname,
                      p.slack_photo_link, r.id AS role_id, r.name AS role
               FROM attendance a
                 JOIN person p ON p.id = a.person_id
                 JOIN role r ON r.id = a.role_id
               WHERE a.session_id = $1
               ORDER BY r.name, p.slack_lastname, p.id"#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attendees)
    }

    pub async fn sign_up_details(
        &self,
        person_id: i32,
        session_id: Option<i32>,
    ) -> Result<Vec<SignUpDetail>, PlannerError> {
        let details = sqlx::query_as::<_, SignUpDetail>(
            r#"SELECT a.session_id, p.slack_firstname, p.slack_lastname, r.name,
                      s.meeting_link, s.date, s.time_start, s.time_end,
                      m.name AS module_name
               FROM attendance a
                 JOIN person p ON p.id = a.person_id
                 JOIN role r ON r.id = a.role_id
                 JOIN session s ON s.id = a.session_id
                 JOIN module m ON m.id = s.module_id
               WHERE a.person_id = $1
                 AND ($2::int IS NULL OR a.session_id = $2)
               ORDER BY s.date, s.time_start, a.session_id"#,
        )
        .bind(person_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(details)
    }
}
