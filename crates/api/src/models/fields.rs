//! Helpers shared by the request payload types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use estate_desk_core::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Distinguish an explicit `null` from an absent field.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accept a JSON string or number for a text column.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Lenient>::deserialize(deserializer)?.map(|value| match value {
        Lenient::Text(s) => s,
        Lenient::Int(n) => n.to_string(),
        Lenient::Float(n) => n.to_string(),
    }))
}

/// Read an integer from a JSON number or a numeric string.
///
/// Fractions, booleans and other shapes yield `None` so the caller can report
/// the problem against its own field.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A relation given either by primary key or as an inline object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Relation<T> {
    Id(i64),
    Inline(T),
}

/// Check an optional text value against a column width.
pub fn check_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: usize,
) -> Option<String> {
    let value = value?;
    if value.chars().count() > max_length {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_length} characters."),
        );
        return None;
    }
    Some(value)
}

/// Require a non-blank text value that fits the column.
pub fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: usize,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, NOT_BLANK);
            None
        }
        Some(v) => check_text(errors, field, Some(v), max_length),
    }
}

/// Require a text value on full updates, check it when present on partial ones.
pub fn text_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: usize,
    partial: bool,
) -> Option<String> {
    if partial && value.is_none() {
        return None;
    }
    require_text(errors, field, value, max_length)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        user: Option<Option<i64>>,
        #[serde(default, deserialize_with = "string_or_number")]
        house_number: Option<String>,
        #[serde(default)]
        agency: Option<Relation<Inline>>,
    }

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct Inline {
        name: String,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.user, None);

        let null: Patch = serde_json::from_str(r#"{"user": null}"#).unwrap();
        assert_eq!(null.user, Some(None));

        let set: Patch = serde_json::from_str(r#"{"user": 4}"#).unwrap();
        assert_eq!(set.user, Some(Some(4)));
    }

    #[test]
    fn test_house_number_accepts_numbers() {
        let parsed: Patch = serde_json::from_str(r#"{"house_number": 12}"#).unwrap();
        assert_eq!(parsed.house_number.as_deref(), Some("12"));

        let parsed: Patch = serde_json::from_str(r#"{"house_number": "12A"}"#).unwrap();
        assert_eq!(parsed.house_number.as_deref(), Some("12A"));
    }

    #[test]
    fn test_relation_by_id_or_inline() {
        let by_id: Patch = serde_json::from_str(r#"{"agency": 3}"#).unwrap();
        assert_eq!(by_id.agency, Some(Relation::Id(3)));

        let inline: Patch = serde_json::from_str(r#"{"agency": {"name": "Acme"}}"#).unwrap();
        assert_eq!(
            inline.agency,
            Some(Relation::Inline(Inline {
                name: "Acme".to_owned()
            }))
        );
    }

    #[test]
    fn test_parse_integer_shapes() {
        assert_eq!(parse_integer(&serde_json::json!(12)), Some(12));
        assert_eq!(parse_integer(&serde_json::json!(" 12 ")), Some(12));
        assert_eq!(parse_integer(&serde_json::json!(12.5)), None);
        assert_eq!(parse_integer(&serde_json::json!("twelve")), None);
        assert_eq!(parse_integer(&serde_json::json!(true)), None);
    }

    #[test]
    fn test_require_text_messages() {
        let mut errors = FieldErrors::new();
        assert!(require_text(&mut errors, "name", None, 10).is_none());
        assert!(require_text(&mut errors, "street", Some("  ".to_owned()), 10).is_none());
        assert!(require_text(&mut errors, "eircode", Some("X".repeat(11)), 10).is_none());
        assert_eq!(
            require_text(&mut errors, "town", Some("Cork".to_owned()), 10).as_deref(),
            Some("Cork")
        );

        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_owned()][..]));
        assert_eq!(errors.get("street"), Some(&[NOT_BLANK.to_owned()][..]));
        assert!(errors.get("eircode").is_some());
        assert!(errors.get("town").is_none());
    }

    #[test]
    fn test_partial_text_field_skips_absent() {
        let mut errors = FieldErrors::new();
        assert!(text_field(&mut errors, "name", None, 10, true).is_none());
        assert!(errors.is_empty());
        assert!(text_field(&mut errors, "name", None, 10, false).is_none());
        assert!(!errors.is_empty());
    }
}
