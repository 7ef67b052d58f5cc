use super::*;

#[test]
fn otp_purpose_wire_tag() {
    assert_eq!(OtpPurpose::Signup.as_str(), "signup");
}

#[test]
fn session_deserializes_provider_payload() {
    let json = r#"{
        "access_token": "tok",
        "refresh_token": "refresh",
        "expires_at": 1754300000,
        "user": {
            "id": "8b5a74c6-9d25-4a53-9c3b-0d2f3c6f1a2e",
            "email": "jane@example.com",
            "email_confirmed_at": "2026-08-01T00:00:00Z",
            "user_metadata": {"username": "janedoe"}
        }
    }"#;
    let session: Session = serde_json::from_str(json).unwrap();
    assert_eq!(session.access_token, "tok");
    assert_eq!(session.expires_at, Some(1_754_300_000));
    assert_eq!(session.user.email, "jane@example.com");
    assert_eq!(
        session.user.user_metadata.get("username").and_then(|v| v.as_str()),
        Some("janedoe")
    );
}

#[test]
fn session_tolerates_missing_optional_fields() {
    let json = r#"{
        "access_token": "tok",
        "user": {"id": "8b5a74c6-9d25-4a53-9c3b-0d2f3c6f1a2e", "email": "jane@example.com"}
    }"#;
    let session: Session = serde_json::from_str(json).unwrap();
    assert!(session.refresh_token.is_none());
    assert!(session.expires_at.is_none());
    assert!(session.user.email_confirmed_at.is_none());
    assert!(session.user.user_metadata.is_null());
}

#[test]
fn signup_metadata_round_trips() {
    let metadata = SignupMetadata {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        username: "janedoe".into(),
        date_of_birth: "1990-05-12".into(),
        profession: "Engineer".into(),
    };
    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["username"], "janedoe");
    assert_eq!(json["date_of_birth"], "1990-05-12");
    let restored: SignupMetadata = serde_json::from_value(json).unwrap();
    assert_eq!(restored.profession, "Engineer");
}
