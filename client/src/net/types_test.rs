use super::*;

#[test]
fn parse_error_detail_string() {
    let body = r#"{"detail":"Email already exists"}"#;
    assert_eq!(parse_error_detail(body).as_deref(), Some("Email already exists"));
}

#[test]
fn parse_error_detail_validation_list_joins_messages() {
    let body = r#"{"detail":[
        {"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"},
        {"loc":["body","password"],"msg":"Field required","type":"missing"}
    ]}"#;
    assert_eq!(
        parse_error_detail(body).as_deref(),
        Some("value is not a valid email address; Field required")
    );
}

#[test]
fn parse_error_detail_missing_or_odd_shapes() {
    assert_eq!(parse_error_detail(r#"{"error":"nope"}"#), None);
    assert_eq!(parse_error_detail(r#"{"detail":42}"#), None);
    assert_eq!(parse_error_detail(r#"{"detail":"   "}"#), None);
    assert_eq!(parse_error_detail(r#"{"detail":[{"loc":[]}]}"#), None);
    assert_eq!(parse_error_detail("<html>502 Bad Gateway</html>"), None);
    assert_eq!(parse_error_detail(""), None);
}

#[test]
fn login_token_ignores_extra_fields() {
    let body = r#"{"message":"Login successful","access_token":"tok123","token_type":"bearer"}"#;
    let token: LoginToken = serde_json::from_str(body).unwrap();
    assert_eq!(token.access_token, "tok123");
}

#[test]
fn user_message_prefers_detail() {
    let err = AuthError::Rejected { status: 401, detail: Some("Invalid email or password".into()) };
    assert_eq!(err.user_message("Login failed"), "Invalid email or password");
}

#[test]
fn user_message_falls_back_without_detail() {
    let rejected = AuthError::Rejected { status: 500, detail: None };
    assert_eq!(rejected.user_message("Login failed"), "Login failed");

    let network = AuthError::Network("connection refused".into());
    assert_eq!(network.detail(), None);
    assert_eq!(network.user_message("Signup failed"), "Signup failed");
}

#[test]
fn credentials_debug_redacts_password() {
    let creds = Credentials::new("a@b.com", "hunter2");
    let printed = format!("{creds:?}");
    assert!(printed.contains("a@b.com"));
    assert!(!printed.contains("hunter2"));
}

#[test]
fn credentials_serialize_as_backend_expects() {
    let json = serde_json::to_value(Credentials::new("a@b.com", "secret")).unwrap();
    assert_eq!(json, serde_json::json!({ "email": "a@b.com", "password": "secret" }));
}
