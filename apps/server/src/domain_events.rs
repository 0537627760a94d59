//! Bridges core domain events onto the server event bus.
//!
//! `emit` runs inside the service call that committed the write, so it only
//! serializes and hands the event to the broadcast channel.

use questboard_core::events::{DomainEvent, DomainEventSink};

use crate::events::{self, EventBus, ServerEvent};

pub struct WebDomainEventSink {
    event_bus: EventBus,
}

impl WebDomainEventSink {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::QuestCreated { .. } => events::QUEST_CREATED,
        DomainEvent::QuestUpdated { .. } => events::QUEST_UPDATED,
        DomainEvent::QuestDeleted { .. } => events::QUEST_DELETED,
        DomainEvent::QuestStatusChanged { .. } => events::QUEST_STATUS_CHANGED,
        DomainEvent::JoinRequested { .. } => events::JOIN_REQUESTED,
        DomainEvent::JoinApproved { .. } => events::JOIN_APPROVED,
        DomainEvent::JoinRejected { .. } => events::JOIN_REJECTED,
        DomainEvent::BadgeGiven { .. } => events::BADGE_GIVEN,
        DomainEvent::QuestCompleted { .. } => events::QUEST_COMPLETED,
    }
}

impl DomainEventSink for WebDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        let name = event_name(&event);
        tracing::debug!(quest_id = event.quest_id(), "Domain event {}", name);
        match serde_json::to_value(&event) {
            Ok(payload) => self
                .event_bus
                .publish(ServerEvent::with_payload(name, payload)),
            Err(err) => {
                tracing::warn!("Failed to serialize domain event {}: {}", name, err);
                self.event_bus.publish(ServerEvent::new(name));
            }
        }
    }
}
