//! Required free-text fields.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`NonBlank`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The input is empty or whitespace only.
    #[error("value cannot be blank")]
    Blank,
    /// The input is too long.
    #[error("value must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A trimmed string that is guaranteed to contain visible characters.
///
/// Used for form fields that must be filled in, such as a shipping
/// recipient or street address.
///
/// ```
/// use parfum_core::NonBlank;
///
/// assert_eq!(NonBlank::parse("  Jl. Sudirman 1 ").map(|t| t.into_inner()).ok(),
///            Some("Jl. Sudirman 1".to_string()));
/// assert!(NonBlank::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NonBlank(String);

impl NonBlank {
    /// Maximum accepted length, in characters.
    pub const MAX_LENGTH: usize = 1000;

    /// Parse a `NonBlank` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TextError::Blank);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(TextError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonBlank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NonBlank {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NonBlank> for String {
    fn from(value: NonBlank) -> Self {
        value.0
    }
}

impl AsRef<str> for NonBlank {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        let text = NonBlank::parse("  Jakarta\n").ok();
        assert_eq!(text.as_ref().map(NonBlank::as_str), Some("Jakarta"));
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(NonBlank::parse(""), Err(TextError::Blank));
        assert_eq!(NonBlank::parse(" \t "), Err(TextError::Blank));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(NonBlank::MAX_LENGTH + 1);
        assert!(matches!(
            NonBlank::parse(&long),
            Err(TextError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<NonBlank, _> = serde_json::from_str("\"12190\"");
        assert!(ok.is_ok());
        let blank: Result<NonBlank, _> = serde_json::from_str("\"  \"");
        assert!(blank.is_err());
    }
}
