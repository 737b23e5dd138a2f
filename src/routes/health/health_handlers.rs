use actix_web::web;

use super::health_models::{HealthResponse, WebsocketStatus};
use crate::websocket::Hub;

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tags = ["health"],
    security([])
)]
pub async fn health() -> web::Json<HealthResponse> {
    web::Json(HealthResponse {
        status: "healthy".into(),
        message: "Task Manager API is running".into(),
    })
}

#[utoipa::path(
    get,
    path = "/websocket/status",
    responses((status = 200, description = "Live WebSocket figures", body = WebsocketStatus)),
    tags = ["health"],
    security([])
)]
pub async fn websocket_status(hub: web::Data<Hub>) -> web::Json<WebsocketStatus> {
    web::Json(WebsocketStatus {
        websocket_enabled: true,
        connected_users: hub.connected_users(),
        active_rooms: hub.active_rooms(),
        status: "active".into(),
    })
}
