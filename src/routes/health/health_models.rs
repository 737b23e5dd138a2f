use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WebsocketStatus {
    pub websocket_enabled: bool,
    pub connected_users: usize,
    pub active_rooms: usize,
    pub status: String,
}
