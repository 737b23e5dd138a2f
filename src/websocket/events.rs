use chrono::Utc;
use log::{info, warn};
use serde_json::Value;

use super::hub::{project_room, Hub};
use super::messages::{EventUser, ServerMessage};
use crate::models::{TaskResponse, User};

fn emit(hub: &Hub, project_id: i64, message: &ServerMessage) -> usize {
    match serde_json::to_string(message) {
        Ok(payload) => hub.broadcast(&project_room(project_id), &payload),
        Err(e) => {
            warn!("Failed to serialize WebSocket event: {}", e);
            0
        }
    }
}

pub fn emit_task_created(hub: &Hub, task: &TaskResponse, user: &User) -> usize {
    let delivered = emit(
        hub,
        task.project_id,
        &ServerMessage::TaskCreated {
            project_id: task.project_id,
            task: task.clone(),
            user: EventUser::from(user),
            timestamp: Utc::now(),
        },
    );
    info!("task_created {} sent to {} connections", task.id, delivered);
    delivered
}

pub fn emit_task_updated(hub: &Hub, task: &TaskResponse, user: &User, changes: Value) -> usize {
    let delivered = emit(
        hub,
        task.project_id,
        &ServerMessage::TaskUpdated {
            project_id: task.project_id,
            task: task.clone(),
            changes,
            user: EventUser::from(user),
            timestamp: Utc::now(),
        },
    );
    info!("task_updated {} sent to {} connections", task.id, delivered);
    delivered
}

pub fn emit_task_deleted(hub: &Hub, task_id: i64, project_id: i64, task_title: &str, user: &User) -> usize {
    let delivered = emit(
        hub,
        project_id,
        &ServerMessage::TaskDeleted {
            project_id,
            task_id,
            task_title: task_title.to_string(),
            user: EventUser::from(user),
            timestamp: Utc::now(),
        },
    );
    info!("task_deleted {} sent to {} connections", task_id, delivered);
    delivered
}
