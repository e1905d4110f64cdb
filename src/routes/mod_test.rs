use super::*;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, header};

const SHELL: &str = "<!doctype html><div id=\"root\"></div>";
const APP_JS: &str = "export const answer = 42;";

fn fixture() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), SHELL).unwrap();
    std::fs::write(dir.path().join("app.js"), APP_JS).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets").join("site.css"), "body{}").unwrap();
    let root = AssetRoot::open(dir.path(), "index.html").unwrap();
    (dir, app(root))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn existing_file_is_served_verbatim() {
    let (_dir, router) = fixture();
    let (status, content_type, body) = get(router, "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, APP_JS);
    assert!(content_type.unwrap().contains("javascript"));
}

#[tokio::test]
async fn nested_file_is_served() {
    let (_dir, router) = fixture();
    let (status, _, body) = get(router, "/assets/site.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "body{}");
}

#[tokio::test]
async fn root_serves_entry_document() {
    let (_dir, router) = fixture();
    let (status, content_type, body) = get(router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SHELL);
    assert!(content_type.unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn unknown_client_route_falls_back_to_entry_document() {
    let (_dir, router) = fixture();
    let (status, _, body) = get(router, "/dashboard/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SHELL);
}

#[tokio::test]
async fn query_string_is_ignored_for_lookup() {
    let (_dir, router) = fixture();
    let (status, _, body) = get(router, "/app.js?v=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, APP_JS);
}

#[tokio::test]
async fn directory_request_falls_back_to_entry_document() {
    let (_dir, router) = fixture();
    let (status, _, body) = get(router, "/assets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SHELL);
}

#[tokio::test]
async fn traversal_attempt_gets_entry_document() {
    let (_dir, router) = fixture();
    let (status, _, body) = get(router, "/%2e%2e/%2e%2e/etc/passwd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SHELL);
}

#[tokio::test]
async fn head_request_returns_ok_without_body() {
    let (_dir, router) = fixture();
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::HEAD)
                .uri("/app.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

// =============================================================================
// read failures
// =============================================================================

#[tokio::test]
async fn entry_document_removed_after_startup_is_server_error() {
    let (dir, router) = fixture();
    std::fs::remove_file(dir.path().join("index.html")).unwrap();
    let (status, _, body) = get(router, "/dashboard/settings").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "failed to read asset");
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_loop_is_server_error_not_fallback() {
    let (dir, router) = fixture();
    std::os::unix::fs::symlink("loop.js", dir.path().join("loop.js")).unwrap();
    let (status, _, body) = get(router, "/loop.js").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "failed to read asset");
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_file_is_server_error() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, router) = fixture();
    let path = dir.path().join("app.js");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::File::open(&path).is_ok() {
        // Privileged user; permission bits are not enforced.
        return;
    }
    let (status, _, body) = get(router, "/app.js").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "failed to read asset");
}
