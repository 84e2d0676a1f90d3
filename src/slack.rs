//! Slack sign-in
//!
//! The front-end opens Slack's authorize page in a popup and hands the
//! returned `code` to `POST /auth/slack`. Here the code is exchanged for an
//! access token through Slack's OpenID Connect endpoints, the profile is
//! read back, and the matching person is created or refreshed.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SlackConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::models::person::normalize_email;
use crate::models::{NewPerson, Person, ProfileUpdate};
use crate::store::PlannerStore;

/// Profile fields the planner keeps from Slack
#[derive(Debug, Clone, PartialEq)]
pub struct SlackProfile {
    pub slack_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    ok: bool,
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    ok: bool,
    error: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

pub struct SlackClient {
    http: reqwest::Client,
    config: SlackConfig,
}

impl SlackClient {
    pub fn new(config: SlackConfig) -> PlannerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PlannerError::Internal(e.into()))?;
        Ok(Self { http, config })
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> PlannerResult<String> {
        let url = format!("{}/openid.connect.token", self.config.api_base);
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
        ];
        if let Some(redirect_uri) = redirect_uri.or(self.config.redirect_uri.as_deref()) {
            form.push(("redirect_uri", redirect_uri));
        }

        let response: TokenResponse = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(slack_error("openid.connect.token", response.error));
        }
        response
            .access_token
            .ok_or_else(|| PlannerError::Upstream("Slack returned no access_token".into()))
    }

    /// Read the signed-in user's profile.
    pub async fn user_info(&self, access_token: &str) -> PlannerResult<SlackProfile> {
        let url = format!("{}/openid.connect.userInfo", self.config.api_base);
        let response: UserInfoResponse = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(slack_error("openid.connect.userInfo", response.error));
        }
        profile_from(response)
    }

    pub async fn sign_in(&self, code: &str, redirect_uri: Option<&str>) -> PlannerResult<SlackProfile> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        self.user_info(&access_token).await
    }
}

fn slack_error(method: &str, error: Option<String>) -> PlannerError {
    let error = error.unwrap_or_else(|| "unknown_error".to_string());
    warn!("Slack {} failed: {}", method, error);
    PlannerError::Upstream(format!("Slack {method} failed: {error}"))
}

fn profile_from(info: UserInfoResponse) -> PlannerResult<SlackProfile> {
    let slack_id = info
        .sub
        .ok_or_else(|| PlannerError::Upstream("Slack profile has no subject".into()))?;
    let email = info
        .email
        .ok_or_else(|| PlannerError::Upstream("Slack profile has no email".into()))?;

    let given = info.given_name.unwrap_or_default();
    let family = info.family_name.unwrap_or_default();
    let (first_name, last_name) = if given.trim().is_empty() {
        split_name(info.name.as_deref().unwrap_or(&email))
    } else {
        (given.trim().to_string(), family.trim().to_string())
    };

    Ok(SlackProfile {
        slack_id,
        email: normalize_email(&email)?,
        first_name,
        last_name,
        picture: info.picture.filter(|p| !p.trim().is_empty()),
    })
}

/// "Ada King Lovelace" -> ("Ada", "King Lovelace")
fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

/// Find the person by Slack id, falling back to email, and refresh their
/// profile; otherwise create them.
pub async fn upsert_person(store: &dyn PlannerStore, profile: &SlackProfile) -> PlannerResult<Person> {
    // Some Slack accounts only have a single name; the profile columns are NOT NULL.
    let last_name = if profile.last_name.is_empty() {
        "-".to_string()
    } else {
        profile.last_name.clone()
    };

    let existing = match store.find_person_by_slack_id(&profile.slack_id).await? {
        Some(person) => Some(person),
        None => store.find_person_by_email(&profile.email).await?,
    };

    if let Some(mut existing) = existing {
        let email = normalize_email(&profile.email)?;
        if existing.slack_id.as_deref() != Some(profile.slack_id.as_str())
            || existing.slack_email != email
        {
            existing = store
                .update_slack_identity(existing.id, &profile.slack_id, &email)
                .await?
                .ok_or_else(|| PlannerError::not_found("person", existing.id))?;
            info!(person_id = existing.id, "re-linked Slack identity");
        }

        let update = ProfileUpdate {
            slack_firstname: profile.first_name.clone(),
            slack_lastname: last_name,
            slack_photo_link: profile.picture.clone(),
        }
        .validated()?;
        let updated = store
            .update_person(existing.id, &update)
            .await?
            .ok_or_else(|| PlannerError::not_found("person", existing.id))?;
        info!(person_id = updated.id, "refreshed Slack profile");
        return Ok(updated);
    }

    let new_person = NewPerson {
        slack_id: Some(profile.slack_id.clone()),
        slack_photo_link: profile.picture.clone(),
        slack_firstname: profile.first_name.clone(),
        slack_lastname: last_name,
        slack_title: String::new(),
        slack_email: profile.email.clone(),
    }
    .validated()?;
    let created = store.create_person(&new_person).await?;
    info!(person_id = created.id, "created person from Slack sign-in");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn info() -> UserInfoResponse {
        UserInfoResponse {
            ok: true,
            error: None,
            sub: Some("U123".into()),
            email: Some("Baki@Example.com".into()),
            name: Some("Baki Yilmaz".into()),
            given_name: Some("".into()),
            family_name: None,
            picture: Some("https://avatars.slack-edge.com/baki.png".into()),
        }
    }

    #[test]
    fn test_profile_falls_back_to_full_name() {
        let profile = profile_from(info()).unwrap();
        assert_eq!(profile.first_name, "Baki");
        assert_eq!(profile.last_name, "Yilmaz");
        assert_eq!(profile.email, "baki@example.com");
    }

    #[test]
    fn test_profile_requires_email() {
        let mut missing = info();
        missing.email = None;
        assert!(matches!(
            profile_from(missing),
            Err(PlannerError::Upstream(_))
        ));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Ada King Lovelace"),
            ("Ada".to_string(), "King Lovelace".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_refreshes() {
        let store = InMemoryStore::new();
        let mut profile = profile_from(info()).unwrap();

        let created = upsert_person(&store, &profile).await.unwrap();
        assert_eq!(created.slack_id.as_deref(), Some("U123"));
        assert_eq!(created.slack_title, "");

        profile.first_name = "Bakiye".into();
        profile.picture = None;
        let refreshed = upsert_person(&store, &profile).await.unwrap();
        assert_eq!(refreshed.id, created.id);
        assert_eq!(refreshed.slack_firstname, "Bakiye");
        assert_eq!(refreshed.slack_photo_link, None);
        assert_eq!(store.list_people().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_follows_slack_id_across_email_change() {
        let store = InMemoryStore::new();
        let mut profile = profile_from(info()).unwrap();
        profile.email = "old@x.org".into();
        let created = upsert_person(&store, &profile).await.unwrap();

        profile.email = "New@X.org".into();
        let moved = upsert_person(&store, &profile).await.unwrap();
        assert_eq!(moved.id, created.id);
        assert_eq!(moved.slack_email, "new@x.org");

        let people = store.list_people().await.unwrap();
        assert_eq!(people.len(), 1);
        assert!(store.find_person_by_email("old@x.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_links_admin_created_person_by_email() {
        let store = InMemoryStore::new();
        let added = store
            .create_person(&NewPerson {
                slack_id: None,
                slack_photo_link: None,
                slack_firstname: "Baki".into(),
                slack_lastname: "Yilmaz".into(),
                slack_title: "Mentor".into(),
                slack_email: "baki@example.com".into(),
            })
            .await
            .unwrap();

        let profile = profile_from(info()).unwrap();
        let linked = upsert_person(&store, &profile).await.unwrap();
        assert_eq!(linked.id, added.id);
        assert_eq!(linked.slack_id.as_deref(), Some("U123"));
        assert_eq!(linked.slack_title, "Mentor");
        assert_eq!(
            store.find_person_by_slack_id("U123").await.unwrap().map(|p| p.id),
            Some(added.id)
        );
    }
}
