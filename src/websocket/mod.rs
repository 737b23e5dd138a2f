//! Realtime task notifications over WebSocket.
//!
//! Clients authenticate with an access token in the `token` query parameter,
//! join project rooms, and receive task events emitted by the REST handlers.

use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::{JwtKeys, TokenType};
use crate::error::ApiError;

pub mod events;
pub mod hub;
pub mod messages;
mod session;

pub use hub::Hub;

#[derive(Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn ws_entry(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<ConnectQuery>,
    keys: web::Data<JwtKeys>,
    hub: web::Data<Hub>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let token = query
        .token
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Missing token query parameter".into()))?;
    let claims = keys
        .verify(token, TokenType::Access)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("Invalid token subject".into()))?;

    let (response, session, stream) = actix_ws::handle(&req, body).map_err(|e| {
        error!("WebSocket upgrade failed: {}", e);
        ApiError::BadRequest("WebSocket upgrade failed".into())
    })?;

    let (connection_id, outgoing) = hub.connect(user_id);
    info!("User {} connected over WebSocket ({})", user_id, connection_id);

    let ws_session = session::WsSession::new(hub.clone(), pool.clone(), user_id, connection_id);
    actix_web::rt::spawn(ws_session.run(session, stream, outgoing));

    Ok(response)
}
