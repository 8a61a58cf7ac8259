//! Agency and solicitor domain types.

use serde::{Deserialize, Serialize};

use estate_desk_core::{AgencyId, Email, FieldErrors, SolicitorId};

use super::fields::{check_text, require_text, string_or_number, text_field};

/// An estate agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    pub house_number: String,
    pub street: String,
    pub town: String,
    pub county: String,
    pub eircode: String,
}

/// A solicitor, optionally working for an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solicitor {
    pub id: SolicitorId,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(rename = "agency")]
    pub agency_id: Option<AgencyId>,
}

impl Solicitor {
    /// Display form, `"{title} {first_name} {last_name}"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.title, self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// The agency reference carried by a solicitor representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyName {
    pub name: String,
}

/// Solicitor representation with its agency name.
#[derive(Debug, Clone, Serialize)]
pub struct SolicitorView {
    pub id: SolicitorId,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub agency: Option<AgencyName>,
}

impl SolicitorView {
    #[must_use]
    pub fn new(solicitor: Solicitor, agency_name: Option<String>) -> Self {
        Self {
            id: solicitor.id,
            title: solicitor.title,
            first_name: solicitor.first_name,
            last_name: solicitor.last_name,
            email: solicitor.email,
            phone_number: solicitor.phone_number,
            agency: agency_name.map(|name| AgencyName { name }),
        }
    }
}

/// Agency representation with its solicitors nested.
#[derive(Debug, Clone, Serialize)]
pub struct AgencyView {
    #[serde(flatten)]
    pub agency: Agency,
    pub solicitors: Vec<SolicitorView>,
}

impl AgencyView {
    #[must_use]
    pub fn new(agency: Agency, solicitors: Vec<Solicitor>) -> Self {
        let solicitors = solicitors
            .into_iter()
            .map(|s| SolicitorView::new(s, Some(agency.name.clone())))
            .collect();
        Self { agency, solicitors }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Agency fields as received, for top-level writes and inline objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgencyPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub house_number: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub eircode: Option<String>,
}

/// Validated agency fields; `None` leaves a column untouched on update and
/// stores an empty string on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgencyFields {
    pub name: Option<String>,
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub eircode: Option<String>,
}

impl AgencyPayload {
    /// Validate a top-level agency write. Every field is required unless `partial`.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(self, partial: bool) -> Result<AgencyFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = AgencyFields {
            name: text_field(&mut errors, "name", self.name, 255, partial),
            house_number: text_field(&mut errors, "house_number", self.house_number, 50, partial),
            street: text_field(&mut errors, "street", self.street, 255, partial),
            town: text_field(&mut errors, "town", self.town, 255, partial),
            county: text_field(&mut errors, "county", self.county, 255, partial),
            eircode: text_field(&mut errors, "eircode", self.eircode, 10, partial),
        };
        errors.into_result()?;
        Ok(fields)
    }

    /// Validate an inline agency inside an application payload.
    ///
    /// Only the column widths are checked; `name` is required by the caller
    /// when the inline object has to create a row.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate_inline(self) -> Result<AgencyFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = AgencyFields {
            name: check_text(&mut errors, "name", self.name, 255),
            house_number: check_text(&mut errors, "house_number", self.house_number, 50),
            street: check_text(&mut errors, "street", self.street, 255),
            town: check_text(&mut errors, "town", self.town, 255),
            county: check_text(&mut errors, "county", self.county, 255),
            eircode: check_text(&mut errors, "eircode", self.eircode, 10),
        };
        errors.into_result()?;
        Ok(fields)
    }
}

/// Solicitor fields as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SolicitorPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone_number: Option<String>,
    /// Agency id, only honoured on `/solicitors/` writes.
    #[serde(default, deserialize_with = "super::fields::deserialize_some")]
    pub agency: Option<Option<i64>>,
}

/// Validated solicitor fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolicitorFields {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// `Some(None)` clears the agency.
    pub agency: Option<Option<AgencyId>>,
}

fn check_email(errors: &mut FieldErrors, value: Option<String>) -> Option<String> {
    let value = check_text(errors, "email", value, 255)?;
    if value.is_empty() {
        return Some(value);
    }
    match Email::parse(&value) {
        Ok(email) => Some(email.into_inner()),
        Err(_) => {
            errors.add("email", "Enter a valid email address.");
            None
        }
    }
}

impl SolicitorPayload {
    /// Validate a top-level solicitor write. Every field except `agency` is
    /// required unless `partial`.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(self, partial: bool) -> Result<SolicitorFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = text_field(&mut errors, "title", self.title, 10, partial);
        let first_name = text_field(&mut errors, "first_name", self.first_name, 50, partial);
        let last_name = text_field(&mut errors, "last_name", self.last_name, 50, partial);
        let email = if partial && self.email.is_none() {
            None
        } else {
            require_text(&mut errors, "email", self.email, 255)
                .and_then(|email| check_email(&mut errors, Some(email)))
        };
        let phone_number = text_field(&mut errors, "phone_number", self.phone_number, 20, partial);
        errors.into_result()?;

        Ok(SolicitorFields {
            title,
            first_name,
            last_name,
            email,
            phone_number,
            agency: self.agency.map(|id| id.map(AgencyId::new)),
        })
    }

    /// Validate an inline solicitor inside an application payload.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate_inline(self) -> Result<SolicitorFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = SolicitorFields {
            title: check_text(&mut errors, "title", self.title, 10),
            first_name: check_text(&mut errors, "first_name", self.first_name, 50),
            last_name: check_text(&mut errors, "last_name", self.last_name, 50),
            email: check_email(&mut errors, self.email),
            phone_number: check_text(&mut errors, "phone_number", self.phone_number, 20),
            agency: None,
        };
        errors.into_result()?;
        Ok(fields)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn solicitor() -> Solicitor {
        Solicitor {
            id: SolicitorId::new(1),
            title: "Mr".to_owned(),
            first_name: "Test".to_owned(),
            last_name: "Name".to_owned(),
            email: "test@example.com".to_owned(),
            phone_number: "1234567890".to_owned(),
            agency_id: Some(AgencyId::new(2)),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(solicitor().display_name(), "Mr Test Name");
    }

    #[test]
    fn test_solicitor_view_nests_agency_name() {
        let view = SolicitorView::new(solicitor(), Some("Acme".to_owned()));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["agency"], serde_json::json!({"name": "Acme"}));

        let view = SolicitorView::new(solicitor(), None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["agency"].is_null());
    }

    #[test]
    fn test_agency_view_is_flat_with_solicitors() {
        let agency = Agency {
            id: AgencyId::new(2),
            name: "Acme".to_owned(),
            house_number: "1".to_owned(),
            street: "Main Street".to_owned(),
            town: "Cork".to_owned(),
            county: "Cork".to_owned(),
            eircode: "T12AB34".to_owned(),
        };
        let json = serde_json::to_value(AgencyView::new(agency, vec![solicitor()])).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["solicitors"][0]["agency"]["name"], "Acme");
    }

    #[test]
    fn test_agency_create_requires_every_field() {
        let payload: AgencyPayload = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        let errors = payload.validate(false).unwrap_err();
        for field in ["house_number", "street", "town", "county", "eircode"] {
            assert!(errors.get(field).is_some(), "{field} should be required");
        }
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_agency_patch_accepts_subset() {
        let payload: AgencyPayload = serde_json::from_str(r#"{"town": "Galway"}"#).unwrap();
        let fields = payload.validate(true).unwrap();
        assert_eq!(fields.town.as_deref(), Some("Galway"));
        assert!(fields.name.is_none());
    }

    #[test]
    fn test_solicitor_email_validated() {
        let payload: SolicitorPayload = serde_json::from_str(
            r#"{"title": "Ms", "first_name": "A", "last_name": "B",
                "email": "not-an-email", "phone_number": "1"}"#,
        )
        .unwrap();
        let errors = payload.validate(false).unwrap_err();
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_solicitor_agency_can_be_cleared() {
        let payload: SolicitorPayload = serde_json::from_str(r#"{"agency": null}"#).unwrap();
        let fields = payload.validate(true).unwrap();
        assert_eq!(fields.agency, Some(None));
    }

    #[test]
    fn test_inline_solicitor_allows_missing_contact_details() {
        let payload: SolicitorPayload =
            serde_json::from_str(r#"{"first_name": "A", "last_name": "B"}"#).unwrap();
        let fields = payload.validate_inline().unwrap();
        assert_eq!(fields.first_name.as_deref(), Some("A"));
        assert!(fields.email.is_none());
    }
}
