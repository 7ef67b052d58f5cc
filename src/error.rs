//! Error types and provider-error classification.
//!
//! ERROR HANDLING
//! ==============
//! Input validation fails synchronously and never reaches the network.
//! Provider/business failures are classified by matching the message text
//! the backend returns; anything unmatched falls back to a generic category
//! that carries the raw provider text. Public operations return these enums
//! instead of panicking or leaking transport errors to page scripts.

use crate::signup::FieldViolation;

/// Failure raised by a provider or profile-store call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response.
    #[error("provider unreachable: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Known provider failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadCredentials,
    EmailUnconfirmed,
    AlreadyRegistered,
    DuplicateUsername,
    ExpiredCode,
    AlreadyVerified,
    RateLimited,
    Other,
}

impl ErrorCategory {
    /// Match a provider failure against the message shapes the backend is
    /// known to emit. Transport failures are always `Other`.
    #[must_use]
    pub fn classify(err: &ProviderError) -> Self {
        let ProviderError::Api { status, message } = err else {
            return Self::Other;
        };
        let message = message.to_ascii_lowercase();
        if *status == 429 || message.contains("rate limit") || message.contains("you can only request this after") {
            return Self::RateLimited;
        }
        if message.contains("invalid login credentials") {
            return Self::BadCredentials;
        }
        if message.contains("email not confirmed") {
            return Self::EmailUnconfirmed;
        }
        if message.contains("already registered") || message.contains("already been registered") {
            return Self::AlreadyRegistered;
        }
        if message.contains("duplicate key") && message.contains("username") {
            return Self::DuplicateUsername;
        }
        if message.contains("already confirmed") || message.contains("already verified") {
            return Self::AlreadyVerified;
        }
        if message.contains("expired") {
            return Self::ExpiredCode;
        }
        Self::Other
    }
}

/// Login failure, scoped to the field the message belongs on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("please enter your email or username")]
    EmptyIdentifier,
    #[error("please enter your password")]
    EmptyPassword,
    #[error("no account found for that identifier")]
    IdentifierNotFound,
    #[error("incorrect email or password")]
    BadCredentials,
    #[error("please confirm your email before logging in")]
    EmailUnconfirmed,
    #[error("login failed: {0}")]
    Other(String),
}

impl LoginError {
    /// Form field the message should be anchored to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyIdentifier | Self::IdentifierNotFound => "identifier",
            Self::EmptyPassword | Self::BadCredentials => "password",
            Self::EmailUnconfirmed | Self::Other(_) => "form",
        }
    }
}

/// Signup failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupError {
    #[error("signup form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldViolation>),
    #[error("that username is already taken")]
    UsernameTaken,
    #[error("an account with that email already exists")]
    EmailRegistered,
    #[error("signup failed: {0}")]
    Other(String),
}

/// One-time-code verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("email is required")]
    EmptyEmail,
    #[error("verification code must be 6 digits")]
    BadCodeFormat,
    #[error("that code has expired; request a new one")]
    ExpiredCode,
    #[error("verification failed: {0}")]
    Other(String),
}

/// Code-resend failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResendError {
    #[error("email is required")]
    EmptyEmail,
    #[error("too many requests; wait a moment before resending")]
    RateLimited,
    #[error("could not resend the code: {0}")]
    Other(String),
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
