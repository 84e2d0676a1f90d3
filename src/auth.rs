//! Bearer tokens and the authenticated principal
//!
//! A token is issued after Slack sign-in and carries the person id and admin
//! flag. Route handlers never read raw tokens; they receive a [`Principal`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlannerError, PlannerResult};
use crate::models::Person;

/// JWT claims issued by the planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Person id
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 tokens
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, person: &Person) -> PlannerResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: person.id.to_string(),
            name: person.display_name(),
            admin: person.is_admin,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| PlannerError::Internal(e.into()))?;
        debug!(person_id = person.id, "issued token");
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> PlannerResult<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| PlannerError::Unauthorized(format!("invalid token: {e}")))?;
        Principal::from_claims(&data.claims)
    }
}

/// The caller behind a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub person_id: i32,
    pub name: String,
    pub is_admin: bool,
}

impl Principal {
    pub fn from_claims(claims: &Claims) -> PlannerResult<Self> {
        let person_id = claims
            .sub
            .parse()
            .map_err(|_| PlannerError::Unauthorized(format!("bad subject '{}'", claims.sub)))?;
        Ok(Self {
            person_id,
            name: claims.name.clone(),
            is_admin: claims.admin,
        })
    }

    pub fn require_admin(&self) -> PlannerResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(PlannerError::Forbidden(format!(
                "{} is not an admin",
                self.name
            )))
        }
    }

    /// Allow acting on one's own record; admins may act on anyone's.
    pub fn require_self_or_admin(&self, person_id: i32) -> PlannerResult<()> {
        if self.person_id == person_id || self.is_admin {
            Ok(())
        } else {
            Err(PlannerError::Forbidden(format!(
                "{} may not act on person {person_id}",
                self.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i32, is_admin: bool) -> Person {
        Person {
            id,
            slack_id: None,
            slack_firstname: "Saim".into(),
            slack_lastname: "Korkmaz".into(),
            slack_photo_link: None,
            slack_title: "Volunteer".into(),
            slack_email: "saim@example.com".into(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = TokenIssuer::from_secret(b"test-secret", Duration::hours(1));
        let issued = issuer.issue(&person(5, true)).unwrap();
        assert!(issued.expires_at > Utc::now());

        let principal = issuer.verify(&issued.token).unwrap();
        assert_eq!(principal.person_id, 5);
        assert_eq!(principal.name, "Saim Korkmaz");
        assert!(principal.is_admin);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let issuer = TokenIssuer::from_secret(b"test-secret", Duration::hours(1));
        let other = TokenIssuer::from_secret(b"other-secret", Duration::hours(1));
        let token = other.issue(&person(5, false)).unwrap().token;
        assert!(matches!(
            issuer.verify(&token),
            Err(PlannerError::Unauthorized(_))
        ));

        let stale = TokenIssuer::from_secret(b"test-secret", Duration::hours(-2));
        let expired = stale.issue(&person(5, false)).unwrap().token;
        assert!(issuer.verify(&expired).is_err());

        assert!(issuer.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_permissions() {
        let user = Principal {
            person_id: 4,
            name: "Anna".into(),
            is_admin: false,
        };
        assert!(user.require_self_or_admin(4).is_ok());
        assert!(matches!(
            user.require_self_or_admin(5),
            Err(PlannerError::Forbidden(_))
        ));
        assert!(user.require_admin().is_err());

        let admin = Principal {
            is_admin: true,
            ..user
        };
        assert!(admin.require_self_or_admin(5).is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
