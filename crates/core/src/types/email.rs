//! Admin email identity.
//!
//! Emails are the only identity an admin has: the proxy forwards one, the
//! directory is keyed by it and audit entries record it. Comparison is
//! exact; the directory file must list addresses as the proxy sends them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was refused as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email must contain exactly one @ symbol")]
    MultipleAtSymbols,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A structurally valid email address: `local@domain`, one `@`, both sides
/// non-empty, no whitespace, at most 254 characters.
///
/// ```
/// use thala_core::Email;
///
/// assert!(Email::parse("ops@thala.app").is_ok());
/// assert!(Email::parse("ops@@thala.app").is_err());
/// assert!(Email::parse("ops@thala@app").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns the first [`EmailError`] rule `s` breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_addresses_parse() {
        for s in ["ops@thala.app", "first.last+admin@thala.app", "a@b"] {
            assert_eq!(Email::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_rejections() {
        let long = format!("{}@thala.app", "a".repeat(250));
        let cases = [
            ("", EmailError::Empty),
            (long.as_str(), EmailError::TooLong { max: 254 }),
            ("ops.thala.app", EmailError::MissingAtSymbol),
            ("a@b@thala.app", EmailError::MultipleAtSymbols),
            ("ops@@thala.app", EmailError::MultipleAtSymbols),
            ("@thala.app", EmailError::EmptyLocalPart),
            ("ops@", EmailError::EmptyDomain),
            ("ops @thala.app", EmailError::Whitespace),
        ];
        for (input, expected) in cases {
            assert_eq!(Email::parse(input).unwrap_err(), expected, "{input:?}");
        }
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let email: Email = serde_json::from_str("\"ops@thala.app\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ops@thala.app\"");
        assert!(serde_json::from_str::<Email>("\"a@b@thala.app\"").is_err());
    }

    #[test]
    fn test_from_str_and_display() {
        let email: Email = "ops@thala.app".parse().unwrap();
        assert_eq!(email.to_string(), "ops@thala.app");
    }
}
