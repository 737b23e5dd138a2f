//! Per-connection WebSocket loop.
//!
//! Pings every 5s and drops the client after 10s without traffic. Room joins
//! are checked against project access before the hub records them.

use std::time::{Duration, Instant};

use actix_web::web;
use actix_ws::{CloseReason, Message, MessageStream, ProtocolError, Session};
use log::{debug, info, warn};
use sqlx::SqlitePool;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;

use super::hub::{project_room, ConnectionId, Hub};
use super::messages::{ClientMessage, ServerMessage};
use crate::models::User;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

enum SessionEnd {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network,
}

pub struct WsSession {
    hub: web::Data<Hub>,
    pool: web::Data<SqlitePool>,
    user_id: i64,
    connection_id: ConnectionId,
}

impl WsSession {
    pub fn new(
        hub: web::Data<Hub>,
        pool: web::Data<SqlitePool>,
        user_id: i64,
        connection_id: ConnectionId,
    ) -> Self {
        WsSession {
            hub,
            pool,
            user_id,
            connection_id,
        }
    }

    pub async fn run(
        self,
        mut session: Session,
        mut stream: MessageStream,
        mut outgoing: UnboundedReceiver<String>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let greeting = ServerMessage::Connected { user_id: self.user_id };
        let mut result = self.send(&mut session, &greeting).await;

        while result.is_ok() {
            result = tokio::select! {
                _ = heartbeat.tick() => {
                    if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
                        Err(SessionEnd::HeartbeatTimeout)
                    } else {
                        session.ping(b"").await.map_err(|_| SessionEnd::Network)
                    }
                }
                Some(payload) = outgoing.recv() => {
                    session.text(payload).await.map_err(|_| SessionEnd::Network)
                }
                message = stream.recv() => {
                    match message {
                        None => Err(SessionEnd::StreamClosed),
                        Some(Err(e)) => Err(SessionEnd::Protocol(e)),
                        Some(Ok(message)) => {
                            last_heartbeat = Instant::now();
                            self.handle_message(&mut session, message).await
                        }
                    }
                }
            };
        }

        self.hub.disconnect(self.connection_id);
        let close_reason = match result {
            Err(SessionEnd::ClientClosed(reason)) => {
                debug!("Client {} closed the socket", self.user_id);
                reason
            }
            Err(SessionEnd::HeartbeatTimeout) => {
                info!("WebSocket heartbeat timed out for user {}", self.user_id);
                None
            }
            Err(SessionEnd::Protocol(e)) => {
                warn!("WebSocket protocol error for user {}: {}", self.user_id, e);
                None
            }
            Err(SessionEnd::Network) | Err(SessionEnd::StreamClosed) => {
                debug!("WebSocket stream closed for user {}", self.user_id);
                return;
            }
            Ok(()) => None,
        };
        if let Err(e) = session.close(close_reason).await {
            warn!("Failed to close WebSocket for user {}: {}", self.user_id, e);
        }
    }

    async fn handle_message(&self, session: &mut Session, message: Message) -> Result<(), SessionEnd> {
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(|_| SessionEnd::Network),
            Message::Text(text) => self.handle_text(session, &text).await,
            Message::Close(reason) => Err(SessionEnd::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => Ok(()),
        }
    }

    async fn handle_text(&self, session: &mut Session, text: &str) -> Result<(), SessionEnd> {
        let reply = match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::JoinProject { project_id }) => self.join_project(project_id).await,
            Ok(ClientMessage::LeaveProject { project_id }) => {
                self.hub.leave(self.connection_id, &project_room(project_id));
                ServerMessage::LeftProject { project_id }
            }
            Ok(ClientMessage::Ping) => ServerMessage::Pong,
            Err(e) => {
                warn!("Rejected malformed WebSocket payload: {}", e);
                ServerMessage::Error {
                    message: "Unrecognised message".to_string(),
                }
            }
        };
        self.send(session, &reply).await
    }

    async fn join_project(&self, project_id: i64) -> ServerMessage {
        match User::can_access_project(&self.pool, self.user_id, project_id).await {
            Ok(true) => {
                let room = project_room(project_id);
                self.hub.join(self.connection_id, &room);
                info!("User {} joined {}", self.user_id, room);
                ServerMessage::JoinedProject { project_id, room }
            }
            Ok(false) => ServerMessage::Error {
                message: "Access denied to project".to_string(),
            },
            Err(e) => {
                warn!("Failed to check project access for user {}: {}", self.user_id, e);
                ServerMessage::Error {
                    message: "Could not join project".to_string(),
                }
            }
        }
    }

    async fn send(&self, session: &mut Session, message: &ServerMessage) -> Result<(), SessionEnd> {
        match serde_json::to_string(message) {
            Ok(body) => session.text(body).await.map_err(|_| SessionEnd::Network),
            Err(e) => {
                warn!("Failed to serialize WebSocket payload: {}", e);
                Ok(())
            }
        }
    }
}
