//! Registry of live WebSocket connections and the project rooms they joined.
//!
//! Each connection owns an unbounded channel; the hub only keeps the sending
//! half, so fan-out never awaits on a slow client.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

pub type ConnectionId = Uuid;

struct Connection {
    user_id: i64,
    sender: UnboundedSender<String>,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, Connection>,
    // user id -> number of open connections
    users: HashMap<i64, usize>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

#[derive(Default)]
pub struct Hub {
    state: Mutex<HubState>,
}

pub fn project_room(project_id: i64) -> String {
    format!("project_{project_id}")
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connect(&self, user_id: i64) -> (ConnectionId, UnboundedReceiver<String>) {
        let (sender, receiver) = unbounded_channel();
        let id = Uuid::new_v4();
        let mut state = self.lock();
        state.connections.insert(
            id,
            Connection {
                user_id,
                sender,
                rooms: HashSet::new(),
            },
        );
        *state.users.entry(user_id).or_insert(0) += 1;
        (id, receiver)
    }

    pub fn disconnect(&self, id: ConnectionId) {
        let mut state = self.lock();
        let Some(connection) = state.connections.remove(&id) else {
            return;
        };
        for room in &connection.rooms {
            remove_from_room(&mut state.rooms, room, id);
        }
        if let Some(count) = state.users.get_mut(&connection.user_id) {
            *count -= 1;
            if *count == 0 {
                state.users.remove(&connection.user_id);
            }
        }
    }

    // Returns false for unknown connections.
    pub fn join(&self, id: ConnectionId, room: &str) -> bool {
        let mut state = self.lock();
        let Some(connection) = state.connections.get_mut(&id) else {
            return false;
        };
        connection.rooms.insert(room.to_string());
        state.rooms.entry(room.to_string()).or_default().insert(id);
        true
    }

    pub fn leave(&self, id: ConnectionId, room: &str) -> bool {
        let mut state = self.lock();
        let Some(connection) = state.connections.get_mut(&id) else {
            return false;
        };
        let was_member = connection.rooms.remove(room);
        remove_from_room(&mut state.rooms, room, id);
        was_member
    }

    // Sends the payload to every connection in the room, returns how many
    // connections accepted it.
    pub fn broadcast(&self, room: &str, payload: &str) -> usize {
        let state = self.lock();
        let Some(members) = state.rooms.get(room) else {
            return 0;
        };
        let delivered = members
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|connection| connection.sender.send(payload.to_string()).is_ok())
            .count();
        debug!("Broadcast to {} delivered to {} connections", room, delivered);
        delivered
    }

    pub fn connected_users(&self) -> usize {
        self.lock().users.len()
    }

    pub fn active_rooms(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }
}

fn remove_from_room(rooms: &mut HashMap<String, HashSet<ConnectionId>>, room: &str, id: ConnectionId) {
    if let Some(members) = rooms.get_mut(room) {
        members.remove(&id);
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}
