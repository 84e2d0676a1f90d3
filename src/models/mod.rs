//! Models module for the class planner
//!
//! This module contains the records exchanged between the HTTP layer and
//! the store: sessions, people, sign-ups and the reference tables.

pub mod attendance;
pub mod person;
pub mod reference;
pub mod session;

// Re-export commonly used types for convenience
pub use attendance::{Attendee, SignUp, SignUpDetail};
pub use person::{NewPerson, Person, ProfileUpdate};
pub use reference::{City, Cohort, Module, NewRole, Role};
pub use session::{NewSession, Session, SessionFilter};

use crate::error::{PlannerError, PlannerResult};

/// Trim a required text field, rejecting it when nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> PlannerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank values collapse to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional link fields must be absolute http(s) URLs.
pub(crate) fn optional_link(field: &str, value: Option<String>) -> PlannerResult<Option<String>> {
    let Some(link) = optional_text(value) else {
        return Ok(None);
    };
    match url::Url::parse(&link) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(link)),
        Ok(parsed) => Err(PlannerError::invalid(format!(
            "{field} must be an http(s) URL, got scheme '{}'",
            parsed.scheme()
        ))),
        Err(e) => Err(PlannerError::invalid(format!("{field} is not a valid URL: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Anna ").unwrap(), "Anna");
        assert!(matches!(
            required_text("name", "   "),
            Err(PlannerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_optional_link() {
        assert_eq!(optional_link("meeting_link", None).unwrap(), None);
        assert_eq!(
            optional_link("meeting_link", Some("  ".into())).unwrap(),
            None
        );
        assert_eq!(
            optional_link("meeting_link", Some("https://zoom.us/j/1".into())).unwrap(),
            Some("https://zoom.us/j/1".to_string())
        );
        assert!(optional_link("meeting_link", Some("ftp://host/file".into())).is_err());
        assert!(optional_link("meeting_link", Some("not a url".into())).is_err());
    }
}
