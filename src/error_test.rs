use super::*;

fn api(status: u16, message: &str) -> ProviderError {
    ProviderError::Api {
        status,
        message: message.to_owned(),
    }
}

// =============================================================================
// ErrorCategory::classify
// =============================================================================

#[test]
fn classifies_bad_credentials() {
    assert_eq!(
        ErrorCategory::classify(&api(400, "Invalid login credentials")),
        ErrorCategory::BadCredentials
    );
}

#[test]
fn classifies_unconfirmed_email() {
    assert_eq!(
        ErrorCategory::classify(&api(400, "Email not confirmed")),
        ErrorCategory::EmailUnconfirmed
    );
}

#[test]
fn classifies_already_registered() {
    assert_eq!(
        ErrorCategory::classify(&api(422, "User already registered")),
        ErrorCategory::AlreadyRegistered
    );
    assert_eq!(
        ErrorCategory::classify(&api(400, "A user with this email address has already been registered")),
        ErrorCategory::AlreadyRegistered
    );
}

#[test]
fn classifies_duplicate_username() {
    assert_eq!(
        ErrorCategory::classify(&api(
            500,
            r#"duplicate key value violates unique constraint "user_profiles_username_key""#
        )),
        ErrorCategory::DuplicateUsername
    );
}

#[test]
fn classifies_expired_code() {
    assert_eq!(
        ErrorCategory::classify(&api(401, "Token has expired or is invalid")),
        ErrorCategory::ExpiredCode
    );
}

#[test]
fn classifies_already_verified() {
    assert_eq!(
        ErrorCategory::classify(&api(400, "User already confirmed")),
        ErrorCategory::AlreadyVerified
    );
}

#[test]
fn classifies_rate_limits_by_status_and_text() {
    assert_eq!(ErrorCategory::classify(&api(429, "whatever")), ErrorCategory::RateLimited);
    assert_eq!(
        ErrorCategory::classify(&api(400, "For security purposes, you can only request this after 60 seconds.")),
        ErrorCategory::RateLimited
    );
    assert_eq!(
        ErrorCategory::classify(&api(400, "Email rate limit exceeded")),
        ErrorCategory::RateLimited
    );
}

#[test]
fn transport_errors_are_other() {
    assert_eq!(
        ErrorCategory::classify(&ProviderError::Transport("connection refused".into())),
        ErrorCategory::Other
    );
}

#[test]
fn unknown_messages_are_other() {
    assert_eq!(ErrorCategory::classify(&api(500, "something odd happened")), ErrorCategory::Other);
}

#[test]
fn classification_is_case_insensitive() {
    assert_eq!(
        ErrorCategory::classify(&api(400, "INVALID LOGIN CREDENTIALS")),
        ErrorCategory::BadCredentials
    );
}

// =============================================================================
// Field scoping + display
// =============================================================================

#[test]
fn login_errors_anchor_to_fields() {
    assert_eq!(LoginError::EmptyIdentifier.field(), "identifier");
    assert_eq!(LoginError::IdentifierNotFound.field(), "identifier");
    assert_eq!(LoginError::EmptyPassword.field(), "password");
    assert_eq!(LoginError::BadCredentials.field(), "password");
    assert_eq!(LoginError::EmailUnconfirmed.field(), "form");
    assert_eq!(LoginError::Other("x".into()).field(), "form");
}

#[test]
fn provider_error_display_includes_status() {
    let err = api(422, "User already registered");
    let text = err.to_string();
    assert!(text.contains("422"));
    assert!(text.contains("already registered"));
}

#[test]
fn other_variants_carry_raw_provider_text() {
    let err = LoginError::Other("provider error (500): boom".into());
    assert!(err.to_string().contains("boom"));
    let err = SignupError::Other("boom".into());
    assert!(err.to_string().contains("boom"));
    let err = VerifyError::Other("boom".into());
    assert!(err.to_string().contains("boom"));
    let err = ResendError::Other("boom".into());
    assert!(err.to_string().contains("boom"));
}

#[test]
fn invalid_signup_counts_violations() {
    let err = SignupError::Invalid(vec![
        FieldViolation::new(crate::signup::SignupField::Email, "bad"),
        FieldViolation::new(crate::signup::SignupField::Password, "weak"),
    ]);
    assert!(err.to_string().contains('2'));
}
