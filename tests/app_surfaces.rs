mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::Value;

use task_manager::app::build_app;
use task_manager::config::Surfaces;

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<&str> {
    resp.headers().get(header::LOCATION).and_then(|value| value.to_str().ok())
}

#[actix_web::test]
async fn health_reports_running() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "Task Manager API is running");
}

#[actix_web::test]
async fn websocket_status_counts_connections() {
    let state = common::state().await;
    let hub = state.hub.clone();
    let app = test::init_service(build_app(state)).await;
    let (connection, _events) = hub.connect(7);
    hub.join(connection, "project_1");

    let req = test::TestRequest::get().uri("/websocket/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["websocket_enabled"], true);
    assert_eq!(body["connected_users"], 1);
    assert_eq!(body["active_rooms"], 1);
    assert_eq!(body["status"], "active");
}

#[actix_web::test]
async fn websocket_requires_a_token() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/ws").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/ws?token=not-a-jwt").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn openapi_document_is_served() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["info"]["title"], "Task Manager API");
    assert!(body["paths"]["/api/tasks"].is_object());
}

#[actix_web::test]
async fn unknown_api_paths_get_the_json_envelope() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/api/nothing-here").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not Found");
}

#[actix_web::test]
async fn unknown_pages_redirect_to_login() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/somewhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), Some("/login"));
}

#[actix_web::test]
async fn plain_api_mounts_no_optional_surfaces() {
    let app = test::init_service(build_app(common::state_with(Surfaces::api_only()).await)).await;

    for uri in ["/api/openapi.json", "/websocket/status", "/login"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let req = test::TestRequest::get().uri("/api/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn pages_require_login() {
    let app = test::init_service(build_app(common::state().await)).await;
    for uri in ["/", "/dashboard", "/projects", "/projects/1", "/tasks/1"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), Some("/login"), "{uri}");
    }
}

#[actix_web::test]
async fn login_page_renders() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).expect("utf-8");
    assert!(html.contains(r#"<form method="post" action="/login">"#));
}

#[actix_web::test]
async fn register_form_checks_password_confirmation() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("username", "henry"),
            ("email", "henry@example.com"),
            ("full_name", "Henry"),
            ("password", "password123"),
            ("confirm_password", "password124"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).expect("utf-8");
    assert!(html.contains("Passwords do not match."));
    assert!(html.contains(r#"value="henry@example.com""#));
}

#[actix_web::test]
async fn cross_origin_preflight_is_allowed() {
    let app = test::init_service(build_app(common::state().await)).await;
    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/health")
        .insert_header((header::ORIGIN, "http://client.example.com"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header((header::ORIGIN, "http://client.example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
