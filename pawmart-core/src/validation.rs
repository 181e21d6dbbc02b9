//! Form input validation shared by sign-up and checkout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// A single rejected form field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub(crate) fn summarize(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Collects field errors so a form reports every problem at once
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error (if any) and pass the value through
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self.errors))
        }
    }
}

/// Strip formatting from a phone number and check its digit count.
///
/// Accepts spaces, dashes, dots, parentheses and a leading `+`; the result
/// is digits only, 10 to 15 of them.
pub fn validate_phone(field: &str, raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, "phone number is required"));
    }

    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(FieldError::new(field, "phone number may only contain digits")),
        }
    }

    if !(10..=15).contains(&digits.len()) {
        return Err(FieldError::new(field, "phone number must have 10 to 15 digits"));
    }
    Ok(digits)
}

pub fn validate_name(field: &str, raw: &str) -> Result<String, FieldError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = name.chars().count();
    if len == 0 {
        return Err(FieldError::new(field, "name is required"));
    }
    if len < 2 || len > 80 {
        return Err(FieldError::new(field, "name must be between 2 and 80 characters"));
    }
    if !name.chars().all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.')) {
        return Err(FieldError::new(field, "name contains invalid characters"));
    }
    Ok(name)
}

/// Loose structural check: one `@`, non-empty local part, dotted domain
pub fn validate_email(field: &str, raw: &str) -> Result<String, FieldError> {
    let email = raw.trim().to_lowercase();
    let invalid = || FieldError::new(field, "email address is invalid");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(email)
}

pub fn validate_required(field: &str, raw: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    if value.chars().count() > 120 {
        return Err(FieldError::new(field, "is too long"));
    }
    Ok(value.to_string())
}

/// 5-digit ZIP or ZIP+4, or a 6-digit PIN
pub fn validate_postal_code(field: &str, raw: &str) -> Result<String, FieldError> {
    let code = raw.trim();
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let valid = match code.split_once('-') {
        Some((zip, plus4)) => zip.len() == 5 && is_digits(zip) && plus4.len() == 4 && is_digits(plus4),
        None => (code.len() == 5 || code.len() == 6) && is_digits(code),
    };

    if valid {
        Ok(code.to_string())
    } else {
        Err(FieldError::new(field, "postal code is invalid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("phone", "+1 (555) 000-0001").unwrap(), "15550000001");
        assert_eq!(validate_phone("phone", "98765 43210").unwrap(), "9876543210");
        assert!(validate_phone("phone", "12345").is_err());
        assert!(validate_phone("phone", "555-CALL-NOW").is_err());
        assert_eq!(
            validate_phone("phone", "  ").unwrap_err().message,
            "phone number is required"
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Mary   Jane ").unwrap(), "Mary Jane");
        assert_eq!(validate_name("name", "O'Neil-Smith").unwrap(), "O'Neil-Smith");
        assert!(validate_name("name", "J").is_err());
        assert!(validate_name("name", "R2D2").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("email", " Pet.Lover@Example.COM ").unwrap(), "pet.lover@example.com");
        assert!(validate_email("email", "no-at-sign").is_err());
        assert!(validate_email("email", "a@b").is_err());
        assert!(validate_email("email", "a@@b.com").is_err());
        assert!(validate_email("email", "@example.com").is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("postal_code", "78701").is_ok());
        assert!(validate_postal_code("postal_code", "78701-1234").is_ok());
        assert!(validate_postal_code("postal_code", "560001").is_ok());
        assert!(validate_postal_code("postal_code", "7870").is_err());
        assert!(validate_postal_code("postal_code", "ABCDE").is_err());
    }

    #[test]
    fn test_field_errors_collects_all() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.check(validate_required("city", "Austin")).as_deref(), Some("Austin"));
        errors.check(validate_required("state", ""));
        errors.check(validate_postal_code("postal_code", "x"));

        match errors.into_result() {
            Err(CoreError::InvalidFields(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["state", "postal_code"]);
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }
}
