//! Reference tables: cities, cohorts, modules and session roles

use serde::{Deserialize, Serialize};

use super::{optional_text, required_text};
use crate::error::PlannerResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct City {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Cohort {
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Module {
    pub id: i32,
    pub name: String,
    pub syllabus_link: Option<String>,
}

/// The part a person plays in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewRole {
    pub fn validated(self) -> PlannerResult<Self> {
        Ok(Self {
            name: required_text("name", &self.name)?,
            description: optional_text(self.description),
        })
    }
}

/// Roles seeded by the initial migration and the in-memory store.
pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("Lead Teacher", "Runs the session and owns the lesson plan"),
    ("Assistant Teacher", "Helps trainees during exercises"),
    ("Coordinator", "Handles logistics, attendance and the venue"),
    ("Personal Development", "Leads the soft-skills portion of the day"),
];
