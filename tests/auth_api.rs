mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use rstest::rstest;
use serde_json::{json, Value};

use common::{register, send, PASSWORD};
use task_manager::app::build_app;

#[actix_web::test]
async fn register_returns_tokens_and_profile() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "johndoe",
            "email": "john@example.com",
            "full_name": "John Doe",
            "password": PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "johndoe");
    assert_eq!(body["user"]["is_active"], true);
    assert!(body["user"].get("password_hash").is_none());
}

#[rstest]
#[case(json!({"username": "jo", "email": "jo@example.com", "full_name": "Jo", "password": PASSWORD}))]
#[case(json!({"username": "johnny", "email": "not-an-email", "full_name": "Jo", "password": PASSWORD}))]
#[case(json!({"username": "johnny", "email": "jo@example.com", "full_name": "", "password": PASSWORD}))]
#[case(json!({"username": "johnny", "email": "jo@example.com", "full_name": "Jo", "password": "12345"}))]
#[case(json!({"username": "johnny"}))]
#[actix_web::test]
async fn register_rejects_invalid_input(#[case] payload: Value) {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation Error");
}

#[actix_web::test]
async fn register_rejects_duplicates() {
    let app = test::init_service(build_app(common::state().await)).await;
    register(&app, "alice").await;

    let same_username = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "other@example.com",
            "full_name": "Alice Again",
            "password": PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, same_username).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Username already exists");

    let same_email = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice2",
            "email": "alice@example.com",
            "full_name": "Alice Again",
            "password": PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, same_email).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Email already exists");
}

#[actix_web::test]
async fn login_checks_credentials() {
    let app = test::init_service(build_app(common::state().await)).await;
    register(&app, "bob").await;

    let ok = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "bob", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, ok).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let wrong = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "bob", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Authentication Error");
    assert_eq!(body["message"], "Invalid username or password");
}

#[actix_web::test]
async fn profile_requires_a_valid_access_token() {
    let app = test::init_service(build_app(common::state().await)).await;
    let account = register(&app, "carol").await;

    let anonymous = test::TestRequest::get().uri("/api/auth/profile").to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

    let with_refresh = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", account.refresh)))
        .to_request();
    assert_eq!(test::call_service(&app, with_refresh).await.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, &account, test::TestRequest::get().uri("/api/auth/profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], account.id);
    assert_eq!(body["email"], "carol@example.com");
}

#[actix_web::test]
async fn profile_update_keeps_emails_unique() {
    let app = test::init_service(build_app(common::state().await)).await;
    let dave = register(&app, "dave").await;
    register(&app, "erin").await;

    let (status, body) = send(
        &app,
        &dave,
        test::TestRequest::put()
            .uri("/api/auth/profile")
            .set_json(json!({ "full_name": "David" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "David");
    assert_eq!(body["email"], "dave@example.com");

    let (status, body) = send(
        &app,
        &dave,
        test::TestRequest::put()
            .uri("/api/auth/profile")
            .set_json(json!({ "email": "erin@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");
}

#[actix_web::test]
async fn refresh_issues_access_token_only_for_refresh_tokens() {
    let app = test::init_service(build_app(common::state().await)).await;
    let account = register(&app, "frank").await;

    let with_access = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .insert_header(account.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, with_access).await.status(), StatusCode::UNAUTHORIZED);

    let with_refresh = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", account.refresh)))
        .to_request();
    let resp = test::call_service(&app, with_refresh).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["access_token"].as_str().is_some());
}

#[actix_web::test]
async fn logout_is_acknowledged() {
    let app = test::init_service(build_app(common::state().await)).await;
    let account = register(&app, "grace").await;
    let (status, body) = send(&app, &account, test::TestRequest::post().uri("/api/auth/logout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");
}
