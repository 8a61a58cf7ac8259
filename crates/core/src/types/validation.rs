//! Field-level validation errors.

use std::collections::BTreeMap;

use serde::Serialize;

/// Validation messages keyed by field name.
///
/// Serializes as `{"field": ["message", ...]}`. Nested fields use dotted
/// paths (`agency.name`), and errors that do not belong to a single field
/// go under [`FieldErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key used for errors that are not tied to one field.
    pub const NON_FIELD: &'static str = "non_field_errors";

    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding one message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record the error of a fallible check, returning the success value.
    pub fn check<T, E: std::fmt::Display>(
        &mut self,
        field: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Record a "required" message when the value is missing.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "This field is required.");
        }
        value
    }

    /// Merge another error set, prefixing its keys with `prefix.`.
    pub fn merge_nested(&mut self, prefix: &str, other: Self) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when any were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("term", "too long");
        errors.add("term", "second");
        errors.add("agency", "This field is required.");

        let json = serde_json::to_value(&errors).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "agency": ["This field is required."],
                "term": ["too long", "second"],
            })
        );
    }

    #[test]
    fn test_require_and_check() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.require("amount", Some(1)), Some(1));
        assert_eq!(errors.require::<i32>("agency", None), None);
        assert_eq!(errors.check::<i32, _>("term", Err("bad")), None);

        assert_eq!(errors.get("agency").map(<[String]>::len), Some(1));
        assert_eq!(errors.get("term"), Some(&["bad".to_owned()][..]));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_merge_nested_prefixes_keys() {
        let mut outer = FieldErrors::new();
        outer.merge_nested("agency", FieldErrors::single("name", "required"));
        assert!(outer.get("agency.name").is_some());
    }

    #[test]
    fn test_display_joins_messages() {
        let errors = FieldErrors::single("term", "bad");
        assert_eq!(errors.to_string(), "term: bad");
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
