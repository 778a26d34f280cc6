//! Identifier validator.
//!
//! Database and user names are spliced into DDL text, so they are restricted
//! to `[A-Za-z0-9_]+` before any statement is built.

use std::borrow::Cow;

use validator::ValidationError;

/// Validates identifiers used in generated administrative statements.
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// Returns `true` if `name` is non-empty and only contains ASCII letters,
    /// digits and underscores.
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }
}

/// A database or user name that passed [`IdentifierValidator`].
///
/// Administrative backends only accept this type, so an unchecked name can
/// never reach a generated statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Returns the identifier if `value` is valid.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        IdentifierValidator::is_valid(&value).then_some(Self(value))
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `validator` hook for identifier fields.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if IdentifierValidator::is_valid(value) {
        Ok(())
    } else {
        Err(ValidationError::new("identifier"))
    }
}

/// `validator` hook for text that must contain something besides whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Returns the first human-readable message from a set of validation errors.
pub fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(Cow::to_string))
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_word_characters() {
        assert!(IdentifierValidator::is_valid("app_db_01"));
        assert!(IdentifierValidator::is_valid("X"));
    }

    #[test]
    fn test_rejects_everything_else() {
        for bad in ["", "a-b", "a b", "db;drop", "naïve", "`x`", "x'"] {
            assert!(!IdentifierValidator::is_valid(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_identifier_parse() {
        assert_eq!(Identifier::parse("reports").unwrap().as_str(), "reports");
        assert!(Identifier::parse("a-b").is_none());
        assert!(Identifier::parse(String::new()).is_none());
    }

    #[test]
    fn test_blank_detection() {
        assert!(validate_not_blank("SELECT 1").is_ok());
        assert!(validate_not_blank("  \n\t").is_err());
    }
}
