//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::badges::BadgeType;
use crate::quests::QuestStatus;

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about committed writes. Emission happens
/// after the write, so a consumer never sees an event for a rejected call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A quest document was inserted.
    QuestCreated {
        quest_id: String,
        organizer_uid: String,
    },

    /// Editable quest fields were overwritten.
    QuestUpdated { quest_id: String },

    /// A quest was hard-deleted. Dangling references are not cleaned up here.
    QuestDeleted { quest_id: String },

    /// The organizer moved the quest along the status machine.
    QuestStatusChanged {
        quest_id: String,
        from: QuestStatus,
        to: QuestStatus,
    },

    JoinRequested {
        quest_id: String,
        requester_uid: String,
    },

    JoinApproved {
        quest_id: String,
        requester_uid: String,
    },

    JoinRejected {
        quest_id: String,
        requester_uid: String,
    },

    BadgeGiven {
        badge_id: String,
        quest_id: String,
        giver_uid: String,
        receiver_uid: String,
        badge_type: BadgeType,
    },

    /// Completion engine flipped the quest to completed.
    QuestCompleted {
        quest_id: String,
        badges_given: usize,
        participants: usize,
    },
}

impl DomainEvent {
    pub fn quest_created(quest_id: impl Into<String>, organizer_uid: impl Into<String>) -> Self {
        Self::QuestCreated {
            quest_id: quest_id.into(),
            organizer_uid: organizer_uid.into(),
        }
    }

    pub fn quest_updated(quest_id: impl Into<String>) -> Self {
        Self::QuestUpdated {
            quest_id: quest_id.into(),
        }
    }

    pub fn quest_deleted(quest_id: impl Into<String>) -> Self {
        Self::QuestDeleted {
            quest_id: quest_id.into(),
        }
    }

    pub fn quest_status_changed(
        quest_id: impl Into<String>,
        from: QuestStatus,
        to: QuestStatus,
    ) -> Self {
        Self::QuestStatusChanged {
            quest_id: quest_id.into(),
            from,
            to,
        }
    }

    pub fn join_requested(quest_id: impl Into<String>, requester_uid: impl Into<String>) -> Self {
        Self::JoinRequested {
            quest_id: quest_id.into(),
            requester_uid: requester_uid.into(),
        }
    }

    pub fn join_approved(quest_id: impl Into<String>, requester_uid: impl Into<String>) -> Self {
        Self::JoinApproved {
            quest_id: quest_id.into(),
            requester_uid: requester_uid.into(),
        }
    }

    pub fn join_rejected(quest_id: impl Into<String>, requester_uid: impl Into<String>) -> Self {
        Self::JoinRejected {
            quest_id: quest_id.into(),
            requester_uid: requester_uid.into(),
        }
    }

    pub fn quest_completed(
        quest_id: impl Into<String>,
        badges_given: usize,
        participants: usize,
    ) -> Self {
        Self::QuestCompleted {
            quest_id: quest_id.into(),
            badges_given,
            participants,
        }
    }

    /// Quest the event refers to.
    pub fn quest_id(&self) -> &str {
        match self {
            Self::QuestCreated { quest_id, .. }
            | Self::QuestUpdated { quest_id }
            | Self::QuestDeleted { quest_id }
            | Self::QuestStatusChanged { quest_id, .. }
            | Self::JoinRequested { quest_id, .. }
            | Self::JoinApproved { quest_id, .. }
            | Self::JoinRejected { quest_id, .. }
            | Self::BadgeGiven { quest_id, .. }
            | Self::QuestCompleted { quest_id, .. } => quest_id,
        }
    }
}
