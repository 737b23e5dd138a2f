// Helpers for the server-rendered pages: the API client, session state and
// display formatting.

use std::time::Duration;

use actix_session::Session;
use actix_web::{http::header, HttpRequest, HttpResponse};
use chrono::{DateTime, NaiveDateTime};
use log::{error, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::UserProfile;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_KEY: &str = "user";
const FLASH_KEY: &str = "_flashes";
const API_TIMEOUT: Duration = Duration::from_secs(10);
const UNREACHABLE: &str = "Could not reach the server. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),
}

// Status and decoded body of an API call.
#[derive(Debug)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse<T: DeserializeOwned>(self) -> Option<T> {
        match serde_json::from_value(self.body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Unexpected API payload: {}", e);
                None
            }
        }
    }

    // The API's error message, for flashing back to the user.
    pub fn message(&self) -> String {
        self.body
            .get("message")
            .or_else(|| self.body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("Something went wrong")
            .to_string()
    }
}

/// HTTP client the pages use to talk to the REST API.
///
/// An empty base URL means "the host that served the current request".
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(ApiClient {
            http: Client::builder().timeout(API_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url_for(&self, req: &HttpRequest) -> String {
        if self.base_url.is_empty() {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        } else {
            self.base_url.clone()
        }
    }

    // A 401 from the API means the stored token is no longer valid, so the
    // session is cleared before reporting it.
    pub async fn send(
        &self,
        req: &HttpRequest,
        session: &Session,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<ApiReply, FrontendError> {
        let url = format!("{}/api{}", self.base_url_for(req), endpoint);
        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = access_token(session) {
            request = request.bearer_auth(token);
        }
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("API request to {} failed: {}", url, e);
            FrontendError::Connection(e)
        })?;
        let status = response.status().as_u16();
        if status == 401 {
            session.clear();
            return Err(FrontendError::Unauthorized);
        }

        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text }));
        Ok(ApiReply { status, body })
    }

    pub async fn get(
        &self,
        req: &HttpRequest,
        session: &Session,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, FrontendError> {
        self.send(req, session, Method::GET, endpoint, None, params).await
    }

    pub async fn post(
        &self,
        req: &HttpRequest,
        session: &Session,
        endpoint: &str,
        body: &Value,
    ) -> Result<ApiReply, FrontendError> {
        self.send(req, session, Method::POST, endpoint, Some(body), &[]).await
    }

    pub async fn patch(
        &self,
        req: &HttpRequest,
        session: &Session,
        endpoint: &str,
        body: &Value,
    ) -> Result<ApiReply, FrontendError> {
        self.send(req, session, Method::PATCH, endpoint, Some(body), &[]).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub level: String,
    pub message: String,
}

pub fn access_token(session: &Session) -> Option<String> {
    session.get::<String>(ACCESS_TOKEN_KEY).ok().flatten()
}

pub fn current_user(session: &Session) -> Option<UserProfile> {
    session.get::<UserProfile>(USER_KEY).ok().flatten()
}

pub fn store_login(
    session: &Session,
    access: &str,
    refresh: &str,
    user: &UserProfile,
) -> Result<(), actix_session::SessionInsertError> {
    session.renew();
    session.insert(ACCESS_TOKEN_KEY, access)?;
    session.insert(REFRESH_TOKEN_KEY, refresh)?;
    session.insert(USER_KEY, user)
}

pub fn flash(session: &Session, level: &str, message: impl Into<String>) {
    let mut flashes = session.get::<Vec<Flash>>(FLASH_KEY).ok().flatten().unwrap_or_default();
    let next = Flash {
        level: level.to_string(),
        message: message.into(),
    };
    if flashes.contains(&next) {
        return;
    }
    flashes.push(next);
    if let Err(e) = session.insert(FLASH_KEY, flashes) {
        warn!("Could not store flash message: {}", e);
    }
}

pub fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove_as::<Vec<Flash>>(FLASH_KEY)
        .and_then(Result::ok)
        .unwrap_or_default()
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

// Pages that need a logged-in user send everyone else to the login form.
pub fn login_required(session: &Session) -> Result<UserProfile, HttpResponse> {
    match (access_token(session), current_user(session)) {
        (Some(_), Some(user)) => Ok(user),
        _ => {
            flash(session, "warning", "Please log in to access this page.");
            Err(redirect("/login"))
        }
    }
}

// What the user sees when a page's API call fails.
pub fn api_failure(session: &Session, err: FrontendError, fallback: &str) -> HttpResponse {
    match err {
        FrontendError::Unauthorized => {
            flash(session, "warning", "Your session has expired. Please log in again.");
            redirect("/login")
        }
        FrontendError::Connection(_) => {
            flash(session, "danger", UNREACHABLE);
            redirect(fallback)
        }
    }
}

// Data a page can render without. Only an expired session leaves the page;
// a failed connection is flashed and the page shows the default.
pub fn page_data<T>(session: &Session, result: Result<ApiReply, FrontendError>) -> Result<T, HttpResponse>
where
    T: DeserializeOwned + Default,
{
    match result {
        Ok(reply) => Ok(reply.parse().unwrap_or_default()),
        Err(FrontendError::Connection(_)) => {
            flash(session, "danger", UNREACHABLE);
            Ok(T::default())
        }
        Err(err) => Err(api_failure(session, err, "/login")),
    }
}

/// ISO timestamps as `YYYY-MM-DD HH:MM`; anything unparsable is shown as is.
pub fn format_datetime(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    value.to_string()
}

pub fn priority_class(priority: &str) -> &'static str {
    match priority {
        "low" => "badge-secondary",
        "medium" => "badge-primary",
        "high" => "badge-warning",
        "critical" => "badge-danger",
        _ => "badge-secondary",
    }
}

pub fn status_class(status: &str) -> &'static str {
    match status {
        "pending" => "badge-light",
        "in_progress" => "badge-info",
        "completed" => "badge-success",
        "cancelled" => "badge-dark",
        _ => "badge-light",
    }
}
