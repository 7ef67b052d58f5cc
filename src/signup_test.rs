use super::*;

fn valid_form() -> SignupForm {
    SignupForm {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        email: "jane.doe@example.com".into(),
        date_of_birth: "1990-05-12".into(),
        username: "janedoe".into(),
        profession: "Engineer".into(),
        password: "Str0ng!pass".into(),
        confirm_password: "Str0ng!pass".into(),
    }
}

fn fields(violations: &[FieldViolation]) -> Vec<SignupField> {
    violations.iter().map(|v| v.field).collect()
}

// =============================================================================
// validate_signup
// =============================================================================

#[test]
fn valid_form_has_no_violations() {
    assert!(validate_signup(&valid_form()).is_empty());
}

#[test]
fn short_first_name_flagged() {
    let mut form = valid_form();
    form.first_name = "J".into();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::FirstName]);
}

#[test]
fn whitespace_only_first_name_flagged() {
    let mut form = valid_form();
    form.first_name = "  J  ".into();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::FirstName]);
}

#[test]
fn malformed_email_flagged() {
    for email in ["", "jane", "@example.com", "jane@", "a@b@c"] {
        let mut form = valid_form();
        form.email = email.into();
        assert_eq!(fields(&validate_signup(&form)), vec![SignupField::Email], "email {email:?}");
    }
}

#[test]
fn missing_date_of_birth_flagged() {
    let mut form = valid_form();
    form.date_of_birth = "  ".into();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::DateOfBirth]);
}

#[test]
fn bad_username_flagged_with_rule_message() {
    let mut form = valid_form();
    form.username = "AB".into();
    let violations = validate_signup(&form);
    assert_eq!(fields(&violations), vec![SignupField::Username]);
    assert!(violations[0].message.contains("lowercase"));
}

#[test]
fn missing_profession_flagged() {
    let mut form = valid_form();
    form.profession = String::new();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::Profession]);
}

#[test]
fn short_password_flagged() {
    let mut form = valid_form();
    form.password = "S1!a".into();
    form.confirm_password = form.password.clone();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::Password]);
}

#[test]
fn password_without_upper_or_special_flagged() {
    let mut form = valid_form();
    form.password = "abc12345".into();
    form.confirm_password = form.password.clone();
    let violations = validate_signup(&form);
    assert_eq!(fields(&violations), vec![SignupField::Password]);
    assert!(violations[0].message.contains("uppercase"));
}

#[test]
fn password_policy_requires_each_class() {
    for password in ["NOLOWER1!", "noupper1!", "NoDigits!", "NoSpec1a"] {
        let mut form = valid_form();
        form.password = password.into();
        form.confirm_password = form.password.clone();
        assert_eq!(
            fields(&validate_signup(&form)),
            vec![SignupField::Password],
            "password {password:?}"
        );
    }
}

#[test]
fn mismatched_confirmation_flagged() {
    let mut form = valid_form();
    form.confirm_password = "Str0ng!pass2".into();
    assert_eq!(fields(&validate_signup(&form)), vec![SignupField::ConfirmPassword]);
}

#[test]
fn all_violations_are_collected_not_short_circuited() {
    let form = SignupForm {
        confirm_password: "different".into(),
        ..SignupForm::default()
    };
    let violations = validate_signup(&form);
    assert_eq!(
        fields(&violations),
        vec![
            SignupField::FirstName,
            SignupField::Email,
            SignupField::DateOfBirth,
            SignupField::Username,
            SignupField::Profession,
            SignupField::Password,
            SignupField::ConfirmPassword,
        ]
    );
}

// =============================================================================
// normalize_email
// =============================================================================

#[test]
fn normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email("  USER@Example.com "), Some("user@example.com".to_owned()));
}

#[test]
fn normalize_email_rejects_invalid_values() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("user"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("user@"), None);
    assert_eq!(normalize_email("a@b@c"), None);
}

// =============================================================================
// normalize_code
// =============================================================================

#[test]
fn normalize_code_accepts_six_digits() {
    assert_eq!(normalize_code("123456"), Some("123456".to_owned()));
    assert_eq!(normalize_code(" 000042 "), Some("000042".to_owned()));
}

#[test]
fn normalize_code_rejects_bad_shapes() {
    assert_eq!(normalize_code("1234"), None);
    assert_eq!(normalize_code("1234567"), None);
    assert_eq!(normalize_code("12345a"), None);
    assert_eq!(normalize_code("12 456"), None);
    assert_eq!(normalize_code(""), None);
}
