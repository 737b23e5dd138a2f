use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{TaskResponse, User};

// Messages a client may send over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinProject { project_id: i64 },
    LeaveProject { project_id: i64 },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl From<&User> for EventUser {
    fn from(user: &User) -> Self {
        EventUser {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user_id: i64,
    },
    JoinedProject {
        project_id: i64,
        room: String,
    },
    LeftProject {
        project_id: i64,
    },
    Pong,
    Error {
        message: String,
    },
    TaskCreated {
        project_id: i64,
        task: TaskResponse,
        user: EventUser,
        timestamp: DateTime<Utc>,
    },
    TaskUpdated {
        project_id: i64,
        task: TaskResponse,
        changes: Value,
        user: EventUser,
        timestamp: DateTime<Utc>,
    },
    TaskDeleted {
        project_id: i64,
        task_id: i64,
        task_title: String,
        user: EventUser,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_messages() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"join_project","project_id":3}"#).expect("join");
        assert_eq!(join, ClientMessage::JoinProject { project_id: 3 });

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).expect("ping");
        assert_eq!(ping, ClientMessage::Ping);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join_project"}"#).is_err());
    }

    #[test]
    fn tags_server_messages() {
        let value = serde_json::to_value(ServerMessage::JoinedProject {
            project_id: 3,
            room: "project_3".into(),
        })
        .expect("json");
        assert_eq!(value["type"], "joined_project");
        assert_eq!(value["room"], "project_3");

        let pong = serde_json::to_value(ServerMessage::Pong).expect("json");
        assert_eq!(pong, serde_json::json!({"type": "pong"}));
    }
}
