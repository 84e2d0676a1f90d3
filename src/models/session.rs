//! Session records
//!
//! A session is one scheduled class: a module week taught to a cohort on a
//! given date. [`Session`] is the flattened view the front-end cards render,
//! with city, cohort and module names already joined in.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{optional_link, optional_text, required_text};
use crate::error::{PlannerError, PlannerResult};

/// Session view joined with cohort, city and module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Session {
    pub id: i32,
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub who_leading: String,
    pub city: String,
    pub cohort: String,
    pub cohort_id: i32,
    pub location: Option<String>,
    pub module_name: String,
    pub module_id: i32,
    pub module_week: i32,
    pub syllabus_link: Option<String>,
    pub meeting_link: Option<String>,
}

/// Payload for creating or replacing a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub who_leading: String,
    pub cohort_id: i32,
    pub module_id: i32,
    pub module_week: i32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_link: Option<String>,
}

impl NewSession {
    /// Check the payload and return it with text fields trimmed.
    pub fn validated(self) -> PlannerResult<Self> {
        if self.time_end <= self.time_start {
            return Err(PlannerError::invalid(format!(
                "time_end ({}) must be after time_start ({})",
                self.time_end, self.time_start
            )));
        }
        if self.module_week < 1 {
            return Err(PlannerError::invalid("module_week must be at least 1"));
        }

        Ok(Self {
            who_leading: required_text("who_leading", &self.who_leading)?,
            location: optional_text(self.location),
            meeting_link: optional_link("meeting_link", self.meeting_link)?,
            ..self
        })
    }
}

/// Filters for the session listing
///
/// Empty filter lists everything. All text comparisons are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    /// City names; a session matches when its city is any of these.
    pub cities: Vec<String>,
    pub cohort_id: Option<i32>,
    pub module_id: Option<i32>,
    /// Inclusive lower date bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub to: Option<NaiveDate>,
    /// Free-text search over module, city, cohort, location and leader
    pub q: Option<String>,
}

impl SessionFilter {
    /// Build the city list from the comma-separated form the city picker sends.
    pub fn parse_cities(raw: Option<&str>) -> Vec<String> {
        raw.map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|city| !city.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
    }

    /// Lowercased search term, `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(PlannerError::invalid(format!(
                    "date range is empty: from {from} is after to {to}"
                )));
            }
        }
        Ok(())
    }

    pub fn matches(&self, session: &Session) -> bool {
        if !self.cities.is_empty()
            && !self
                .cities
                .iter()
                .any(|city| city.eq_ignore_ascii_case(&session.city))
        {
            return false;
        }
        if self.cohort_id.is_some_and(|id| id != session.cohort_id) {
            return false;
        }
        if self.module_id.is_some_and(|id| id != session.module_id) {
            return false;
        }
        if self.from.is_some_and(|from| session.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| session.date > to) {
            return false;
        }
        match self.search_term() {
            None => true,
            Some(term) => [
                Some(session.module_name.as_str()),
                Some(session.city.as_str()),
                Some(session.cohort.as_str()),
                session.location.as_deref(),
                Some(session.who_leading.as_str()),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: 1,
            date: NaiveDate::from_ymd_opt(2023, 12, 11).unwrap(),
            time_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            who_leading: "John Doe".into(),
            city: "Manchester".into(),
            cohort: "NW-6".into(),
            cohort_id: 3,
            location: Some("Federation House".into()),
            module_name: "JavaScript Core".into(),
            module_id: 2,
            module_week: 1,
            syllabus_link: None,
            meeting_link: None,
        }
    }

    fn new_session() -> NewSession {
        NewSession {
            date: NaiveDate::from_ymd_opt(2023, 12, 11).unwrap(),
            time_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            who_leading: "  John Doe ".into(),
            cohort_id: 3,
            module_id: 2,
            module_week: 1,
            location: Some("   ".into()),
            meeting_link: Some("https://meet.example.com/abc".into()),
        }
    }

    #[test]
    fn test_validated_trims_fields() {
        let valid = new_session().validated().unwrap();
        assert_eq!(valid.who_leading, "John Doe");
        assert_eq!(valid.location, None);
        assert_eq!(
            valid.meeting_link.as_deref(),
            Some("https://meet.example.com/abc")
        );
    }

    #[test]
    fn test_validated_rejects_bad_times_and_weeks() {
        let mut backwards = new_session();
        backwards.time_end = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(matches!(
            backwards.validated(),
            Err(PlannerError::InvalidInput(_))
        ));

        let mut week_zero = new_session();
        week_zero.module_week = 0;
        assert!(week_zero.validated().is_err());

        let mut nobody = new_session();
        nobody.who_leading = " ".into();
        assert!(nobody.validated().is_err());
    }

    #[test]
    fn test_parse_cities() {
        assert_eq!(
            SessionFilter::parse_cities(Some("London, Manchester,,")),
            vec!["London".to_string(), "Manchester".to_string()]
        );
        assert!(SessionFilter::parse_cities(None).is_empty());
    }

    #[test]
    fn test_filter_matches() {
        let s = session();
        assert!(SessionFilter::default().matches(&s));

        let by_city = SessionFilter {
            cities: vec!["london".into(), "manchester".into()],
            ..Default::default()
        };
        assert!(by_city.matches(&s));

        let other_city = SessionFilter {
            cities: vec!["Glasgow".into()],
            ..Default::default()
        };
        assert!(!other_city.matches(&s));

        let by_dates = SessionFilter {
            from: NaiveDate::from_ymd_opt(2023, 12, 11),
            to: NaiveDate::from_ymd_opt(2023, 12, 11),
            ..Default::default()
        };
        assert!(by_dates.matches(&s));

        let too_late = SessionFilter {
            from: NaiveDate::from_ymd_opt(2023, 12, 12),
            ..Default::default()
        };
        assert!(!too_late.matches(&s));

        let search = SessionFilter {
            q: Some("  federation ".into()),
            ..Default::default()
        };
        assert!(search.matches(&s));

        let miss = SessionFilter {
            q: Some("react".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&s));
    }

    #[test]
    fn test_filter_validate_rejects_inverted_range() {
        let filter = SessionFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 2),
            to: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
