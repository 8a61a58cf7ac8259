//! Loan application domain types, representations and payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use estate_desk_core::{
    AgencyId, ApplicationId, ApplicationStatusId, Email, FieldErrors, LoanAmount, LoanTerm,
    SolicitorId, UserId,
};

use super::agency::{
    Agency, AgencyFields, AgencyPayload, Solicitor, SolicitorFields, SolicitorPayload,
};
use super::fields::{
    INVALID_INTEGER, NOT_NULL, REQUIRED, Relation, check_text, deserialize_some, parse_integer,
};

/// A row of the application status lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStatus {
    pub id: ApplicationStatusId,
    pub name: String,
}

/// A loan application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub id: ApplicationId,
    pub amount: LoanAmount,
    pub term: LoanTerm,
    #[serde(rename = "user")]
    pub user_id: Option<UserId>,
    #[serde(rename = "application_status")]
    pub application_status_id: Option<ApplicationStatusId>,
    #[serde(rename = "agency")]
    pub agency_id: Option<AgencyId>,
    #[serde(rename = "created_by")]
    pub created_by_id: Option<UserId>,
    #[serde(rename = "lead_solicitor")]
    pub lead_solicitor_id: Option<SolicitorId>,
    pub date_submitted: DateTime<Utc>,
}

/// Column values written by an insert or a full-row update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub amount: LoanAmount,
    pub term: LoanTerm,
    pub user_id: Option<UserId>,
    pub application_status_id: Option<ApplicationStatusId>,
    pub agency_id: Option<AgencyId>,
    pub created_by_id: Option<UserId>,
    pub lead_solicitor_id: Option<SolicitorId>,
}

impl From<&Application> for ApplicationRecord {
    fn from(app: &Application) -> Self {
        Self {
            amount: app.amount,
            term: app.term,
            user_id: app.user_id,
            application_status_id: app.application_status_id,
            agency_id: app.agency_id,
            created_by_id: app.created_by_id,
            lead_solicitor_id: app.lead_solicitor_id,
        }
    }
}

/// List representation: relations as ids.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub amount: LoanAmount,
    pub term: LoanTerm,
    pub user: Option<UserId>,
    pub application_status: Option<ApplicationStatusId>,
    pub created_by: Option<UserId>,
}

impl From<Application> for ApplicationSummary {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            amount: app.amount,
            term: app.term,
            user: app.user_id,
            application_status: app.application_status_id,
            created_by: app.created_by_id,
        }
    }
}

/// Detail representation: agency, status and lead solicitor expanded.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub id: ApplicationId,
    pub amount: LoanAmount,
    pub term: LoanTerm,
    pub user: Option<UserId>,
    pub application_status: Option<ApplicationStatus>,
    pub created_by: Option<UserId>,
    pub agency: Option<Agency>,
    pub lead_solicitor: Option<Solicitor>,
    pub date_submitted: DateTime<Utc>,
}

// =============================================================================
// Payloads
// =============================================================================

/// Inline application status: matched by `id`, otherwise by `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Inline user reference: matched by `id`, otherwise by `email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserRefPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /applications/` and `PUT|PATCH /applications/{id}/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationPayload {
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Kept raw so a non-integer is reported on `term` rather than as a
    /// malformed body.
    #[serde(default)]
    pub term: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub user: Option<Option<Relation<UserRefPayload>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub application_status: Option<Option<Relation<StatusPayload>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub agency: Option<Option<Relation<AgencyPayload>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub lead_solicitor: Option<Option<Relation<SolicitorPayload>>>,
}

/// A validated relation: an existing row by id, or inline fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationInput<F> {
    Id(i64),
    Inline(F),
}

/// How a user reference identifies an existing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(UserId),
    Email(Email),
}

/// Validated inline status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFields {
    pub id: Option<ApplicationStatusId>,
    pub name: Option<String>,
}

/// Validated application write. `None` means "not supplied".
#[derive(Debug, Clone, Default)]
pub struct ApplicationInput {
    pub amount: Option<LoanAmount>,
    pub term: Option<LoanTerm>,
    /// `Some(None)` unlinks the user.
    pub user: Option<Option<UserRef>>,
    pub application_status: Option<RelationInput<StatusFields>>,
    pub agency: Option<RelationInput<AgencyFields>>,
    pub lead_solicitor: Option<RelationInput<SolicitorFields>>,
}

/// Check a relation that may not be null, and that must be present on full writes.
fn required_relation<P>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Option<Relation<P>>>,
    partial: bool,
) -> Option<Relation<P>> {
    match value {
        None => {
            if !partial {
                errors.add(field, REQUIRED);
            }
            None
        }
        Some(None) => {
            errors.add(field, NOT_NULL);
            None
        }
        Some(Some(relation)) => Some(relation),
    }
}

/// Validate an inline object, nesting its errors under `field`.
fn inline<P, F>(
    errors: &mut FieldErrors,
    field: &str,
    relation: Relation<P>,
    validate: impl FnOnce(P) -> Result<F, FieldErrors>,
) -> Option<RelationInput<F>> {
    match relation {
        Relation::Id(id) => Some(RelationInput::Id(id)),
        Relation::Inline(payload) => match validate(payload) {
            Ok(fields) => Some(RelationInput::Inline(fields)),
            Err(nested) => {
                errors.merge_nested(field, nested);
                None
            }
        },
    }
}

fn validate_status(payload: StatusPayload) -> Result<StatusFields, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = check_text(&mut errors, "name", payload.name, 255);
    if payload.id.is_none() && name.is_none() {
        errors.add(FieldErrors::NON_FIELD, "Either `id` or `name` is required.");
    }
    errors.into_result()?;
    Ok(StatusFields {
        id: payload.id.map(ApplicationStatusId::new),
        name,
    })
}

fn validate_user(errors: &mut FieldErrors, relation: Relation<UserRefPayload>) -> Option<UserRef> {
    match relation {
        Relation::Id(id) => Some(UserRef::Id(UserId::new(id))),
        Relation::Inline(UserRefPayload { id: Some(id), .. }) => Some(UserRef::Id(UserId::new(id))),
        Relation::Inline(UserRefPayload {
            email: Some(email), ..
        }) => match Email::parse(&email) {
            Ok(email) => Some(UserRef::Email(email)),
            Err(_) => {
                errors.add("user.email", "Enter a valid email address.");
                None
            }
        },
        Relation::Inline(_) => {
            errors.add("user", "Either `id` or `email` is required.");
            None
        }
    }
}

impl ApplicationPayload {
    /// Validate the payload. Unless `partial`, `amount`, `term`, `agency`,
    /// `application_status` and `lead_solicitor` are required.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self, partial: bool) -> Result<ApplicationInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let amount = match self.amount {
            None if !partial => {
                errors.add("amount", REQUIRED);
                None
            }
            None => None,
            Some(value) => errors.check("amount", LoanAmount::new(value)),
        };

        let term = match self.term {
            None if !partial => {
                errors.add("term", REQUIRED);
                None
            }
            None => None,
            Some(value) => match parse_integer(&value) {
                Some(months) => {
                    let months = i32::try_from(months)
                        .unwrap_or(if months > 0 { i32::MAX } else { i32::MIN });
                    errors.check("term", LoanTerm::new(months))
                }
                None => {
                    errors.add("term", INVALID_INTEGER);
                    None
                }
            },
        };

        let user = match self.user {
            None => None,
            Some(None) => Some(None),
            Some(Some(relation)) => validate_user(&mut errors, relation).map(Some),
        };

        let application_status =
            required_relation(&mut errors, "application_status", self.application_status, partial)
                .and_then(|r| inline(&mut errors, "application_status", r, validate_status));
        let agency = required_relation(&mut errors, "agency", self.agency, partial)
            .and_then(|r| inline(&mut errors, "agency", r, AgencyPayload::validate_inline));
        let lead_solicitor =
            required_relation(&mut errors, "lead_solicitor", self.lead_solicitor, partial)
                .and_then(|r| {
                    inline(&mut errors, "lead_solicitor", r, SolicitorPayload::validate_inline)
                });

        errors.into_result()?;
        Ok(ApplicationInput {
            amount,
            term,
            user,
            application_status,
            agency,
            lead_solicitor,
        })
    }
}

/// Query string of `GET /applications/`.
#[derive(Debug, Default, Deserialize)]
pub struct ApplicationFilter {
    pub agency: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: serde_json::Value) -> ApplicationPayload {
        serde_json::from_value(value).unwrap()
    }

    fn full() -> serde_json::Value {
        json!({
            "amount": "350000",
            "term": 12,
            "agency": {"name": "Test Agency"},
            "application_status": 1,
            "lead_solicitor": {"first_name": "Test", "last_name": "Name"},
        })
    }

    #[test]
    fn test_valid_create_payload() {
        let input = payload(full()).validate(false).unwrap();
        assert_eq!(input.amount.unwrap().to_string(), "350000.00");
        assert_eq!(input.term.unwrap().months(), 12);
        assert_eq!(input.application_status, Some(RelationInput::Id(1)));
        assert!(matches!(
            input.agency,
            Some(RelationInput::Inline(ref a)) if a.name.as_deref() == Some("Test Agency")
        ));
        assert!(input.user.is_none());
    }

    #[test]
    fn test_term_out_of_range_rejected() {
        for term in [0, 37] {
            let mut body = full();
            body["term"] = json!(term);
            let errors = payload(body).validate(false).unwrap_err();
            assert!(errors.get("term").is_some(), "term {term} should be rejected");
        }
    }

    #[test]
    fn test_term_accepts_numeric_string() {
        let mut body = full();
        body["term"] = json!("24");
        let input = payload(body).validate(false).unwrap();
        assert_eq!(input.term.unwrap().months(), 24);
    }

    #[test]
    fn test_non_integer_term_is_a_field_error() {
        for term in [json!(12.5), json!("twelve"), json!(true)] {
            let mut body = full();
            body["term"] = term.clone();
            let errors = payload(body).validate(false).unwrap_err();
            assert_eq!(
                errors.get("term"),
                Some(&[INVALID_INTEGER.to_owned()][..]),
                "term {term}"
            );
        }
    }

    #[test]
    fn test_huge_term_reports_range() {
        let mut body = full();
        body["term"] = json!(10_000_000_000_i64);
        let errors = payload(body).validate(false).unwrap_err();
        assert_eq!(
            errors.get("term"),
            Some(&["Ensure this value is less than or equal to 36.".to_owned()][..])
        );
    }

    #[test]
    fn test_required_relations_missing_or_null() {
        let errors = payload(json!({"amount": "10", "term": 3, "agency": null}))
            .validate(false)
            .unwrap_err();
        assert_eq!(errors.get("agency"), Some(&[NOT_NULL.to_owned()][..]));
        assert_eq!(errors.get("application_status"), Some(&[REQUIRED.to_owned()][..]));
        assert_eq!(errors.get("lead_solicitor"), Some(&[REQUIRED.to_owned()][..]));
    }

    #[test]
    fn test_errors_are_collected_together() {
        let errors = payload(json!({"amount": "1.234", "term": 99}))
            .validate(false)
            .unwrap_err();
        assert!(errors.get("amount").is_some());
        assert!(errors.get("term").is_some());
        assert!(errors.get("agency").is_some());
    }

    #[test]
    fn test_partial_amount_only() {
        let input = payload(json!({"amount": 500})).validate(true).unwrap();
        assert_eq!(input.amount.unwrap().to_string(), "500.00");
        assert!(input.term.is_none());
        assert!(input.agency.is_none());
        assert!(input.user.is_none());
    }

    #[test]
    fn test_partial_null_required_relation_rejected() {
        let errors = payload(json!({"lead_solicitor": null}))
            .validate(true)
            .unwrap_err();
        assert!(errors.get("lead_solicitor").is_some());
    }

    #[test]
    fn test_user_may_be_cleared_or_given_by_email() {
        let input = payload(json!({"user": null})).validate(true).unwrap();
        assert_eq!(input.user, Some(None));

        let input = payload(json!({"user": {"email": "a@Example.com"}}))
            .validate(true)
            .unwrap();
        assert_eq!(
            input.user,
            Some(Some(UserRef::Email(Email::parse("a@example.com").unwrap())))
        );
    }

    #[test]
    fn test_inline_status_needs_id_or_name() {
        let errors = payload(json!({"application_status": {}}))
            .validate(true)
            .unwrap_err();
        assert!(errors.get("application_status.non_field_errors").is_some());
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let errors = payload(json!({"agency": {"eircode": "X".repeat(11)}}))
            .validate(true)
            .unwrap_err();
        assert!(errors.get("agency.eircode").is_some());
    }

    #[test]
    fn test_summary_carries_ids_only() {
        let app = Application {
            id: ApplicationId::new(5),
            amount: LoanAmount::new(Decimal::new(1_000, 0)).unwrap(),
            term: LoanTerm::new(6).unwrap(),
            user_id: None,
            application_status_id: Some(ApplicationStatusId::new(1)),
            agency_id: Some(AgencyId::new(2)),
            created_by_id: Some(UserId::new(3)),
            lead_solicitor_id: Some(SolicitorId::new(4)),
            date_submitted: Utc::now(),
        };
        let json = serde_json::to_value(ApplicationSummary::from(app)).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 5,
                "amount": "1000.00",
                "term": 6,
                "user": null,
                "application_status": 1,
                "created_by": 3,
            })
        );
    }
}
