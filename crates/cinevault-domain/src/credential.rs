//! Credential input rules: email syntax and password strength.

use std::fmt;
use std::str::FromStr;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum accepted password length in characters. Bounds hashing cost.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Maximum length of a display name field.
pub const MAX_NAME_LEN: usize = 64;

/// Rejection reasons for user-supplied credential fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("password must be at most {} characters", MAX_PASSWORD_LEN)]
    PasswordTooLong,
    #[error("password must contain a letter and a digit")]
    PasswordTooWeak,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0} is too long")]
    FieldTooLong(&'static str),
}

/// Syntactically valid, lower-cased email address.
///
/// Lookups, cache keys and the unique constraint all use this form, so
/// `A@X.com` and `a@x.com` address the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let normalized = raw.trim().to_lowercase();
        if !EmailAddress::is_valid(&normalized) {
            return Err(CredentialError::InvalidEmail);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a new password against the strength policy.
///
/// Applied on registration and on password update; never on login, so
/// accounts created under an older policy can still sign in.
pub fn check_password_strength(password: &str) -> Result<(), CredentialError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooLong);
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(CredentialError::PasswordTooWeak);
    }
    Ok(())
}

/// Trim a display name and check it is present and bounded.
pub fn normalize_name(field: &'static str, raw: &str) -> Result<String, CredentialError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CredentialError::EmptyField(field));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CredentialError::FieldTooLong(field));
    }
    Ok(name.to_owned())
}
