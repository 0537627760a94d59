use serde_json::Value;
use tokio::sync::broadcast;

/// Canonical event names pushed to connected clients.
pub const QUESTS_SNAPSHOT: &str = "quests:snapshot";
pub const QUEST_CREATED: &str = "quest:created";
pub const QUEST_UPDATED: &str = "quest:updated";
pub const QUEST_DELETED: &str = "quest:deleted";
pub const QUEST_STATUS_CHANGED: &str = "quest:status-changed";
pub const QUEST_COMPLETED: &str = "quest:completed";
pub const JOIN_REQUESTED: &str = "join:requested";
pub const JOIN_APPROVED: &str = "join:approved";
pub const JOIN_REJECTED: &str = "join:rejected";
pub const BADGE_GIVEN: &str = "badge:given";

/// Serializable envelope that carries event names and optional payloads.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn with_payload(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ServerEvent) {
        // No connected clients is not an error.
        let _ = self.sender.send(event);
    }
}
