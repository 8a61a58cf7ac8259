//! User and team domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estate_desk_core::{Email, FieldErrors, TeamId, UserId};

use super::fields::{NOT_BLANK, REQUIRED, check_text};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Name of the team self-registered users join.
pub const DEFAULT_TEAM: &str = "Default";

/// A team of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

/// A user account. The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    #[serde(rename = "team")]
    pub team_id: Option<TeamId>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// List representation of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub team: Option<TeamId>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            team: user.team_id,
        }
    }
}

/// Fields written when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
    pub team_id: Option<TeamId>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Body of `POST /user/create/` and `PUT|PATCH /user/me/`.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Validated account fields; `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct AccountChanges {
    pub email: Option<Email>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UserPayload {
    /// Validate the payload. On a full write `email` and `password` are required.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(self, partial: bool) -> Result<AccountChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = match self.email {
            None if !partial => {
                errors.add("email", REQUIRED);
                None
            }
            None => None,
            Some(raw) if raw.trim().is_empty() => {
                errors.add("email", NOT_BLANK);
                None
            }
            Some(raw) => match Email::parse(&raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.add("email", "Enter a valid email address.");
                    None
                }
            },
        };

        let password = match self.password {
            None if !partial => {
                errors.add("password", REQUIRED);
                None
            }
            None => None,
            Some(p) if p.is_empty() => {
                errors.add("password", NOT_BLANK);
                None
            }
            Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
                errors.add(
                    "password",
                    format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
                );
                None
            }
            Some(p) => Some(p),
        };

        let name = check_text(&mut errors, "name", self.name, 255);

        errors.into_result()?;
        Ok(AccountChanges {
            email,
            password,
            name,
        })
    }
}

/// Body of `POST /user/token/`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response of `POST /user/token/`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(json: &str) -> UserPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_create_requires_email_and_password() {
        let errors = payload(r#"{"name": "Test"}"#).validate(false).unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn test_short_password_rejected() {
        let errors = payload(r#"{"email": "a@b.com", "password": "pw", "name": "x"}"#)
            .validate(false)
            .unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some(&["Ensure this field has at least 5 characters.".to_owned()][..])
        );
    }

    #[test]
    fn test_invalid_email_rejected() {
        let errors = payload(r#"{"email": "nope", "password": "testpass"}"#)
            .validate(false)
            .unwrap_err();
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_partial_allows_name_only() {
        let changes = payload(r#"{"name": "New Name"}"#).validate(true).unwrap();
        assert_eq!(changes.name.as_deref(), Some("New Name"));
        assert!(changes.email.is_none());
        assert!(changes.password.is_none());
    }

    #[test]
    fn test_user_serialization_omits_secrets() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("test@example.com").unwrap(),
            name: "Test".to_owned(),
            team_id: Some(TeamId::new(2)),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["team"], 2);
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("created_at").is_none());
    }
}
