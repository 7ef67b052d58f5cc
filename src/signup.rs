//! Signup form validation.
//!
//! ERROR HANDLING
//! ==============
//! Every check here is local and synchronous. Violations are collected, not
//! short-circuited, so the form can light up each offending field in one
//! pass, and no network call happens until the whole form is clean.

use serde::{Deserialize, Serialize};

use crate::username::validate_username;

/// Characters that satisfy the password special-character requirement.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};:,.<>?";
pub const PASSWORD_MIN_LEN: usize = 8;

const FIRST_NAME_MIN_LEN: usize = 2;
const CODE_LEN: usize = 6;

/// Raw signup form contents as entered on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub username: String,
    pub profession: String,
    pub password: String,
    pub confirm_password: String,
}

/// Form field a violation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupField {
    FirstName,
    Email,
    DateOfBirth,
    Username,
    Profession,
    Password,
    ConfirmPassword,
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: SignupField,
    pub message: String,
}

impl FieldViolation {
    pub(crate) fn new(field: SignupField, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Check the whole form, returning every violation in field order. Empty
/// means the form is ready for the availability pre-check and provider call.
#[must_use]
pub fn validate_signup(form: &SignupForm) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if form.first_name.trim().chars().count() < FIRST_NAME_MIN_LEN {
        violations.push(FieldViolation::new(
            SignupField::FirstName,
            format!("first name must be at least {FIRST_NAME_MIN_LEN} characters"),
        ));
    }
    if normalize_email(&form.email).is_none() {
        violations.push(FieldViolation::new(SignupField::Email, "enter a valid email address"));
    }
    if form.date_of_birth.trim().is_empty() {
        violations.push(FieldViolation::new(SignupField::DateOfBirth, "date of birth is required"));
    }
    if let Err(e) = validate_username(&form.username) {
        violations.push(FieldViolation::new(SignupField::Username, e.to_string()));
    }
    if form.profession.trim().is_empty() {
        violations.push(FieldViolation::new(SignupField::Profession, "profession is required"));
    }
    if let Some(message) = password_policy_violation(&form.password) {
        violations.push(FieldViolation::new(SignupField::Password, message));
    }
    if form.password != form.confirm_password {
        violations.push(FieldViolation::new(SignupField::ConfirmPassword, "passwords do not match"));
    }

    violations
}

/// Trim and lowercase an email, checking basic shape: exactly one `@` with
/// non-empty local and domain parts. `None` when the value cannot be an
/// address.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

/// Trim a one-time code, requiring exactly six ASCII digits.
#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized = code.trim();
    if normalized.len() != CODE_LEN || !normalized.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(normalized.to_owned())
}

fn password_policy_violation(password: &str) -> Option<String> {
    if password.len() < PASSWORD_MIN_LEN {
        return Some(format!("password must be at least {PASSWORD_MIN_LEN} characters"));
    }
    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;
    for c in password.chars() {
        has_upper |= c.is_ascii_uppercase();
        has_lower |= c.is_ascii_lowercase();
        has_digit |= c.is_ascii_digit();
        has_special |= PASSWORD_SPECIAL_CHARS.contains(c);
    }
    if has_upper && has_lower && has_digit && has_special {
        None
    } else {
        Some(format!(
            "password needs an uppercase letter, a lowercase letter, a digit, and one of {PASSWORD_SPECIAL_CHARS}"
        ))
    }
}

#[cfg(test)]
#[path = "signup_test.rs"]
mod tests;
