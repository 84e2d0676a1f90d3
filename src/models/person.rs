//! People known to the planner
//!
//! Profiles are sourced from Slack sign-in, which is why the columns keep
//! their `slack_` prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_link, optional_text, required_text};
use crate::error::{PlannerError, PlannerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Person {
    pub id: i32,
    pub slack_id: Option<String>,
    pub slack_firstname: String,
    pub slack_lastname: String,
    pub slack_photo_link: Option<String>,
    pub slack_title: String,
    pub slack_email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.slack_firstname, self.slack_lastname)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub slack_id: Option<String>,
    #[serde(default)]
    pub slack_photo_link: Option<String>,
    pub slack_firstname: String,
    pub slack_lastname: String,
    #[serde(default)]
    pub slack_title: String,
    pub slack_email: String,
}

impl NewPerson {
    pub fn validated(self) -> PlannerResult<Self> {
        Ok(Self {
            slack_id: optional_text(self.slack_id),
            slack_photo_link: optional_link("slack_photo_link", self.slack_photo_link)?,
            slack_firstname: required_text("slack_firstname", &self.slack_firstname)?,
            slack_lastname: required_text("slack_lastname", &self.slack_lastname)?,
            slack_title: self.slack_title.trim().to_string(),
            slack_email: normalize_email(&self.slack_email)?,
        })
    }
}

/// Name and photo update, as refreshed on every Slack sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub slack_firstname: String,
    pub slack_lastname: String,
    #[serde(default)]
    pub slack_photo_link: Option<String>,
}

impl ProfileUpdate {
    pub fn validated(self) -> PlannerResult<Self> {
        Ok(Self {
            slack_firstname: required_text("slack_firstname", &self.slack_firstname)?,
            slack_lastname: required_text("slack_lastname", &self.slack_lastname)?,
            slack_photo_link: optional_link("slack_photo_link", self.slack_photo_link)?,
        })
    }
}

/// Emails are stored lowercased so lookups by email are case-insensitive.
pub fn normalize_email(email: &str) -> PlannerResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(PlannerError::invalid(format!(
            "slack_email '{email}' is not an email address"
        ))),
    }
}
