//! Input validation for form data.
//!
//! These predicates run before anything is sent to the network. Forms
//! combine them with the `FieldErrors` collector from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Strict email check used by login and registration forms
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Looser check used by the faculty profile form
    static ref PROFILE_EMAIL_REGEX: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
}

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum length of a trimmed display name.
pub const MIN_NAME_LEN: usize = 2;

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_profile_email(email: &str) -> bool {
    PROFILE_EMAIL_REGEX.is_match(email)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn validate_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_LEN
}

pub fn validate_confirm_password(password: &str, confirm_password: &str) -> bool {
    password == confirm_password
}

pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}
