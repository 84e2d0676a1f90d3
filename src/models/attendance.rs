//! Sign-ups: who attends which session, and in what role

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One attendance row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SignUp {
    pub id: i32,
    pub session_id: i32,
    pub person_id: i32,
    pub role_id: i32,
}

/// A session attendee with resolved name and role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Attendee {
    pub person_id: i32,
    pub slack_firstname: String,
    pub slack_lastname: String,
    pub slack_photo_link: Option<String>,
    pub role_id: i32,
    pub role: String,
}

/// A person's sign-up joined with their name, the role name and the
/// session's meeting link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SignUpDetail {
    pub session_id: i32,
    pub slack_firstname: String,
    pub slack_lastname: String,
    /// Role name
    pub name: String,
    pub meeting_link: Option<String>,
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub module_name: String,
}
