use super::*;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use serde_json::{Value, json};

// =============================================================================
// Fake backend
// =============================================================================

async fn fake_signup(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@b.com" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Email already exists" }))).into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": { "id": "u1", "email": body["email"] } })),
    )
        .into_response()
}

async fn fake_login(Json(body): Json<Value>) -> Response {
    if body["email"] == "a@b.com" && body["password"] == "secret" {
        return Json(json!({ "message": "Login successful", "access_token": "tok123", "token_type": "bearer" }))
            .into_response();
    }
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid email or password" }))).into_response()
}

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn api_for(router: Router) -> HttpAuthApi {
    let base = spawn_backend(router).await;
    HttpAuthApi::new(base, AuthTimeouts::default()).unwrap()
}

fn backend() -> Router {
    Router::new()
        .route("/signup", post(fake_signup))
        .route("/login", post(fake_login))
}

// =============================================================================
// HttpAuthApi
// =============================================================================

#[test]
fn new_trims_trailing_slash() {
    let api = HttpAuthApi::new("http://localhost:8000/", AuthTimeouts::default()).unwrap();
    assert_eq!(api.base_url(), "http://localhost:8000");
    assert_eq!(api.endpoint("login"), "http://localhost:8000/login");
}

#[tokio::test]
async fn login_success_returns_token() {
    let api = api_for(backend()).await;
    let token = api.login(&Credentials::new("a@b.com", "secret")).await.unwrap();
    assert_eq!(token.access_token, "tok123");
}

#[tokio::test]
async fn login_rejection_carries_detail() {
    let api = api_for(backend()).await;
    let err = api.login(&Credentials::new("a@b.com", "wrong")).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    assert_eq!(err.detail(), Some("Invalid email or password"));
}

#[tokio::test]
async fn signup_created_is_ok() {
    let api = api_for(backend()).await;
    api.signup(&Credentials::new("new@b.com", "pw")).await.unwrap();
}

#[tokio::test]
async fn signup_duplicate_carries_detail() {
    let api = api_for(backend()).await;
    let err = api.signup(&Credentials::new("taken@b.com", "pw")).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 400, .. }));
    assert_eq!(err.detail(), Some("Email already exists"));
}

#[tokio::test]
async fn login_success_without_token_is_malformed() {
    let router = Router::new().route("/login", post(|| async { Json(json!({ "message": "ok" })) }));
    let api = api_for(router).await;
    let err = api.login(&Credentials::new("a@b.com", "secret")).await.unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
    assert_eq!(err.detail(), None);
}

#[tokio::test]
async fn server_error_without_json_has_no_detail() {
    let router = Router::new().route("/login", post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
    let api = api_for(router).await;
    let err = api.login(&Credentials::new("a@b.com", "secret")).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 502, detail: None }));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpAuthApi::new(format!("http://{addr}"), AuthTimeouts::default()).unwrap();
    let err = api.signup(&Credentials::new("a@b.com", "secret")).await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}

// =============================================================================
// parse_login_response
// =============================================================================

#[test]
fn parse_login_response_rejects_empty_token() {
    let err = parse_login_response(r#"{"access_token":""}"#).unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
}

#[test]
fn parse_login_response_rejects_non_json() {
    assert!(matches!(parse_login_response("ok"), Err(AuthError::MalformedResponse(_))));
}
