//! Application assembly: shared state, middleware and the route groups that
//! the configured surfaces switch on.

use std::io;

use actix_cors::Cors;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use log::info;
use sha2::{Digest, Sha512};
use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db;
use crate::doc::ApiDoc;
use crate::error::{json_error_handler, path_error_handler, query_error_handler, ErrorResponse};
use crate::routes::frontend::frontend_utils::{redirect, ApiClient};
use crate::routes::routes;
use crate::websocket::Hub;

const SESSION_COOKIE: &str = "task_manager_session";

// Everything a worker needs, cloned into each `App`.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub pool: web::Data<SqlitePool>,
    pub keys: web::Data<JwtKeys>,
    pub hub: web::Data<Hub>,
    pub api: web::Data<ApiClient>,
    session_key: Key,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Result<Self, reqwest::Error> {
        let api = ApiClient::new(&config.api_base_url)?;
        Ok(AppState {
            keys: web::Data::new(JwtKeys::from_config(&config)),
            session_key: session_key(&config.secret_key),
            config: web::Data::new(config),
            pool: web::Data::new(pool),
            hub: web::Data::new(Hub::new()),
            api: web::Data::new(api),
        })
    }
}

// Cookie keys need 64 bytes; any secret is stretched to that with SHA-512.
fn session_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

// Unknown API paths get the JSON envelope, page paths go back to the login form.
async fn not_found(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    if config.surfaces.frontend && !req.path().starts_with("/api") {
        return redirect("/login");
    }
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Not Found".into(),
        message: "The requested resource was not found".into(),
    })
}

pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppState {
        config,
        pool,
        keys,
        hub,
        api,
        session_key,
    } = state;
    let surfaces = config.surfaces;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), session_key)
        .cookie_name(SESSION_COOKIE.into())
        .cookie_path("/".into())
        .cookie_secure(config.profile.is_production())
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::days(1)),
        )
        .build();

    App::new()
        .app_data(config)
        .app_data(pool)
        .app_data(keys)
        .app_data(hub)
        .app_data(api)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .wrap(session)
        // Separately hosted clients call the API and /ws from any origin.
        .wrap(Cors::permissive())
        .wrap(Logger::default())
        .configure(routes::health_configure)
        .configure(routes::auth_configure)
        .configure(routes::projects_configure)
        .configure(routes::tasks_configure)
        .configure(routes::comments_configure)
        .configure(|cfg| {
            if surfaces.api_docs {
                cfg.service(
                    SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()),
                );
            }
            if surfaces.websocket {
                routes::websocket_configure(cfg);
            }
            if surfaces.frontend {
                routes::frontend_configure(cfg);
            }
        })
        .default_service(web::to(not_found))
}

pub async fn run_server(config: Config) -> io::Result<()> {
    let pool = db::connect_lazy(&config.database_url).map_err(io::Error::other)?;
    db::probe(&pool).await;
    if config.testing {
        // The testing database lives in memory and starts empty.
        db::migrate(&pool).await.map_err(io::Error::other)?;
    }

    let bind_address = config.bind_address();
    info!(
        "Starting Task Manager ({} profile) on {}:{} with {:?}",
        config.profile, bind_address.0, bind_address.1, config.surfaces
    );
    let state = AppState::new(config, pool).map_err(io::Error::other)?;

    HttpServer::new(move || build_app(state.clone()))
        .bind(bind_address)?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_stable_for_a_secret() {
        assert_eq!(session_key("secret").master(), session_key("secret").master());
        assert_ne!(session_key("secret").master(), session_key("other").master());
    }
}
