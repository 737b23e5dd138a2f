#![allow(dead_code)]

use std::net::TcpListener;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, HttpServer};
use serde_json::{json, Value};

use task_manager::app::{build_app, AppState};
use task_manager::config::{Config, Surfaces};
use task_manager::db;

pub const PASSWORD: &str = "password123";
pub const SESSION_COOKIE: &str = "task_manager_session";

pub async fn state_from(config: Config) -> AppState {
    let pool = db::connect("sqlite::memory:").await.expect("pool");
    db::migrate(&pool).await.expect("migrations");
    AppState::new(config, pool).expect("app state")
}

pub async fn state_with(surfaces: Surfaces) -> AppState {
    let mut config = Config::testing();
    config.surfaces = surfaces;
    state_from(config).await
}

pub async fn state() -> AppState {
    state_with(Surfaces::all()).await
}

pub struct Account {
    pub id: i64,
    pub access: String,
    pub refresh: String,
}

impl Account {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.access))
    }
}

pub async fn register<S, B>(app: &S, username: &str) -> Account
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "full_name": format!("{username} Tester"),
            "password": PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    Account {
        id: body["user"]["id"].as_i64().expect("user id"),
        access: body["access_token"].as_str().expect("access token").to_string(),
        refresh: body["refresh_token"].as_str().expect("refresh token").to_string(),
    }
}

pub async fn create_project<S, B>(app: &S, owner: &Account, name: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(owner.bearer())
        .set_json(json!({ "name": name, "description": "Test project" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    body["id"].as_i64().expect("project id")
}

pub async fn add_member<S, B>(app: &S, manager: &Account, project_id: i64, user_id: i64, role: &str)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri(&format!("/api/projects/{project_id}/members"))
        .insert_header(manager.bearer())
        .set_json(json!({ "user_id": user_id, "role": role }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

pub async fn create_task<S, B>(app: &S, author: &Account, project_id: i64, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut body = body;
    body["project_id"] = json!(project_id);
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(author.bearer())
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}

// Status and JSON body of an authenticated request.
pub async fn send<S, B>(
    app: &S,
    account: &Account,
    req: test::TestRequest,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.insert_header(account.bearer()).to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

/// A running server on a free local port whose pages call back into its own
/// API.
pub struct LiveServer {
    pub base_url: String,
    pub state: AppState,
    handle: actix_web::dev::ServerHandle,
}

impl LiveServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    // `extra` mounts test-only routes next to the application's.
    pub async fn start_with<F>(extra: F) -> Self
    where
        F: Fn(&mut web::ServiceConfig) + Clone + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let base_url = format!("http://{addr}");

        let mut config = Config::testing();
        config.api_base_url = base_url.clone();
        let state = state_from(config).await;

        let app_state = state.clone();
        let server = HttpServer::new(move || build_app(app_state.clone()).configure(extra.clone()))
            .workers(1)
            .listen(listener)
            .expect("bind test server")
            .disable_signals()
            .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        LiveServer {
            base_url,
            state,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str) -> Account {
        let body: Value = reqwest::Client::new()
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "full_name": format!("{username} Tester"),
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("register request")
            .json()
            .await
            .expect("register body");
        Account {
            id: body["user"]["id"].as_i64().expect("user id"),
            access: body["access_token"].as_str().expect("access token").to_string(),
            refresh: body["refresh_token"].as_str().expect("refresh token").to_string(),
        }
    }

    pub async fn post_json(&self, account: &Account, path: &str, body: Value) -> Value {
        let resp = reqwest::Client::new()
            .post(self.url(path))
            .bearer_auth(&account.access)
            .json(&body)
            .send()
            .await
            .expect("api request");
        assert!(resp.status().is_success(), "{path}: {}", resp.status());
        resp.json().await.expect("api body")
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

pub struct Page {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

/// Cookie-carrying client for the server-rendered pages. Redirects are
/// returned, never followed.
pub struct Browser {
    http: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

impl Browser {
    pub fn new(base_url: &str) -> Self {
        Browser {
            http: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("http client"),
            base_url: base_url.to_string(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> Page {
        let request = self.http.get(format!("{}{}", self.base_url, path));
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, form: &[(&str, &str)]) -> Page {
        let request = self.http.post(format!("{}{}", self.base_url, path)).form(form);
        self.send(request).await
    }

    async fn send(&mut self, mut request: reqwest::RequestBuilder) -> Page {
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie.clone());
        }
        let resp = request.send().await.expect("page request");
        for value in resp.headers().get_all(reqwest::header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let pair = value.split(';').next().unwrap_or_default();
            if pair.starts_with(&format!("{SESSION_COOKIE}=")) {
                self.cookie = Some(pair.to_string());
            }
        }
        let status = resp.status().as_u16();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.expect("page body");
        Page {
            status,
            location,
            body,
        }
    }
}
