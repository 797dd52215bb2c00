//! Shared building blocks for validating submitted forms.
//!
//! Forms are deserialized as raw strings and then validated field by field so
//! that every problem can be shown next to the input that caused it.

use std::collections::BTreeMap;

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Message shown when a required field is left empty.
pub const REQUIRED_MESSAGE: &str = "This field is required.";
/// Message shown when a date field cannot be parsed.
pub const INVALID_DATE_MESSAGE: &str = "Enter a valid date.";

/// The format used by HTML date inputs, e.g. "2025-01-31".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Validation messages keyed by the name of the form field they belong to.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. Only the first error for a field is kept.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The error message for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Get the trimmed value of a required field, recording an error if it is empty.
pub fn required<'a>(errors: &mut FieldErrors, field: &'static str, raw: &'a str) -> Option<&'a str> {
    let value = raw.trim();

    if value.is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
        None
    } else {
        Some(value)
    }
}

/// Parse a date in the format used by HTML date inputs.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), DATE_FORMAT)
}

/// Parse a required date field, recording an error if it is empty or malformed.
pub fn date_field(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<Date> {
    let value = required(errors, field, raw)?;

    match parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, INVALID_DATE_MESSAGE);
            None
        }
    }
}

/// Format a date for an HTML date input.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{
        FieldErrors, INVALID_DATE_MESSAGE, REQUIRED_MESSAGE, date_field, format_date, required,
    };

    #[test]
    fn keeps_first_error_per_field() {
        let mut errors = FieldErrors::new();

        errors.add("name", "first");
        errors.add("name", "second");

        assert_eq!(errors.get("name"), Some("first"));
        assert_eq!(errors.get("other"), None);
        assert!(!errors.is_empty());
    }

    #[test]
    fn required_rejects_whitespace() {
        let mut errors = FieldErrors::new();

        assert_eq!(required(&mut errors, "name", " \t"), None);
        assert_eq!(errors.get("name"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn required_trims_value() {
        let mut errors = FieldErrors::new();

        assert_eq!(required(&mut errors, "name", "  Rent "), Some("Rent"));
        assert!(errors.is_empty());
    }

    #[test]
    fn date_field_parses_iso_dates() {
        let mut errors = FieldErrors::new();

        assert_eq!(
            date_field(&mut errors, "date", "2023-08-23"),
            Some(date!(2023 - 08 - 23))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn date_field_rejects_malformed_dates() {
        let mut errors = FieldErrors::new();

        assert_eq!(date_field(&mut errors, "date", "23/08/2023"), None);
        assert_eq!(errors.get("date"), Some(INVALID_DATE_MESSAGE));
    }

    #[test]
    fn formats_dates_for_inputs() {
        assert_eq!(format_date(date!(2024 - 02 - 09)), "2024-02-09");
    }
}
