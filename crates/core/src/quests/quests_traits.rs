//! Quest repository and service traits.
//!
//! These traits define the contract for quest operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::quests_model::{
    JoinRequest, NewQuest, Quest, QuestOrder, QuestStatus, QuestUpdate, StatusChange,
};
use crate::errors::Result;
use crate::subscriptions::{SnapshotCallback, Subscription};

/// Trait defining the contract for quest document storage.
///
/// Single-field mutations (`put_join_request`, `add_participant`, ...) are
/// atomic on their own document; nothing spans documents. Mutating a missing
/// quest fails with `Error::NotFound`.
#[async_trait]
pub trait QuestRepositoryTrait: Send + Sync {
    /// Inserts a new document, assigning an id when the input has none.
    async fn insert(&self, new_quest: NewQuest) -> Result<Quest>;

    /// Returns `None` when the id does not exist.
    fn find_by_id(&self, quest_id: &str) -> Result<Option<Quest>>;

    /// Looks up a quest by its (title, organizer, location) fingerprint.
    fn find_by_dedupe_key(&self, dedupe_key: &str) -> Result<Option<Quest>>;

    /// Lists an organizer's quests.
    ///
    /// `QuestOrder::CreatedDesc` fails with `DatabaseError::MissingIndex` when
    /// the supporting index is absent.
    fn list_by_organizer(&self, organizer_uid: &str, order: QuestOrder) -> Result<Vec<Quest>>;

    /// Full collection, newest first.
    fn list_all(&self) -> Result<Vec<Quest>>;

    /// Overwrites the supplied editable fields. No concurrency token.
    async fn update(&self, update: QuestUpdate) -> Result<Quest>;

    /// Moves the stored quest along the status machine, checking the
    /// transition against the status read in the same write.
    ///
    /// Writing the current status again is a no-op (`StatusChange::changed`
    /// is false). A forbidden move fails with `Error::ConstraintViolation`.
    async fn set_status(
        &self,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<StatusChange>;

    /// Writes (or overwrites) the `join_requests[requester_uid]` entry.
    ///
    /// Fails with `Error::ConstraintViolation`, leaving the document untouched,
    /// when the requester is the organizer or already a participant, or the
    /// quest is terminal.
    async fn put_join_request(
        &self,
        quest_id: &str,
        requester_uid: &str,
        request: JoinRequest,
    ) -> Result<()>;

    /// Deletes the `join_requests[requester_uid]` entry. Returns true if it existed.
    async fn remove_join_request(&self, quest_id: &str, requester_uid: &str) -> Result<bool>;

    /// Array-union on participants. Returns true if the uid was added.
    async fn add_participant(&self, quest_id: &str, uid: &str) -> Result<bool>;

    /// Hard delete. Returns the number of removed documents.
    async fn delete(&self, quest_id: &str) -> Result<usize>;

    /// Registers a snapshot listener fed after every committed write.
    fn subscribe(&self, callback: SnapshotCallback<Quest>) -> Subscription;
}

/// Trait defining the contract for quest service operations.
#[async_trait]
pub trait QuestServiceTrait: Send + Sync {
    /// Validates and creates a quest, returning an existing record when the
    /// duplicate check matches.
    async fn create_quest(&self, new_quest: NewQuest) -> Result<Quest>;

    /// Fails with `Error::NotFound` when absent.
    fn get_quest(&self, quest_id: &str) -> Result<Quest>;

    fn list_quests(&self) -> Result<Vec<Quest>>;

    /// Newest first when indexed, otherwise unordered.
    fn list_quests_by_organizer(&self, organizer_uid: &str) -> Result<Vec<Quest>>;

    /// Organizer-only edit of the editable fields.
    async fn update_quest(&self, caller_uid: &str, update: QuestUpdate) -> Result<Quest>;

    /// Organizer-only move along the status machine.
    async fn change_status(
        &self,
        quest_id: &str,
        caller_uid: &str,
        status: QuestStatus,
    ) -> Result<Quest>;

    /// Organizer-only hard delete.
    async fn delete_quest(&self, quest_id: &str, caller_uid: &str) -> Result<()>;

    fn subscribe(&self, callback: SnapshotCallback<Quest>) -> Subscription;
}
