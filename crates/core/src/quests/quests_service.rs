use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

use super::quests_model::{NewQuest, Quest, QuestOrder, QuestStatus, QuestUpdate};
use super::quests_traits::{QuestRepositoryTrait, QuestServiceTrait};
use crate::errors::{require_field, Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::profiles::{ProfileArray, ProfileCounter, ProfileRepositoryTrait};
use crate::saga::SagaTracker;
use crate::subscriptions::{SnapshotCallback, Subscription};

/// Service for managing quest documents.
pub struct QuestService {
    repository: Arc<dyn QuestRepositoryTrait>,
    profile_repository: Option<Arc<dyn ProfileRepositoryTrait>>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl QuestService {
    pub fn new(repository: Arc<dyn QuestRepositoryTrait>) -> Self {
        Self {
            repository,
            profile_repository: None,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    /// Enables organizer bookkeeping (`questsCreated`, `totalQuestsCreated`)
    /// after each fresh insert.
    pub fn with_profile_repository(mut self, profiles: Arc<dyn ProfileRepositoryTrait>) -> Self {
        self.profile_repository = Some(profiles);
        self
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn load_as_organizer(&self, quest_id: &str, caller_uid: &str, action: &str) -> Result<Quest> {
        let quest = self.get_quest(quest_id)?;
        if !quest.is_organizer(caller_uid) {
            return Err(Error::PermissionDenied(format!(
                "Only the organizer can {} quest {}",
                action, quest_id
            )));
        }
        Ok(quest)
    }

    /// Trailing best-effort writes on the organizer's profile.
    async fn record_on_organizer(&self, quest: &Quest) {
        let Some(profiles) = &self.profile_repository else {
            return;
        };
        let mut saga = SagaTracker::new("record_quest_created", quest.id.as_str());
        saga.record("insert_quest", Ok(())).ok();

        let appended = saga.record_best_effort(
            "append_quests_created",
            profiles
                .array_union(&quest.organizer_uid, ProfileArray::QuestsCreated, &quest.id)
                .await,
        );
        if appended == Some(true) {
            saga.record_best_effort(
                "increment_total_quests_created",
                profiles
                    .increment(&quest.organizer_uid, ProfileCounter::TotalQuestsCreated, 1)
                    .await,
            );
        }
    }
}

#[async_trait]
impl QuestServiceTrait for QuestService {
    async fn create_quest(&self, new_quest: NewQuest) -> Result<Quest> {
        new_quest.validate()?;

        // Best-effort only: two concurrent creates can both miss here.
        match self.repository.find_by_dedupe_key(&new_quest.dedupe_key()) {
            Ok(Some(existing)) => {
                debug!(
                    "Quest '{}' by {} at '{}' already exists as {}",
                    new_quest.title, new_quest.organizer_uid, new_quest.location, existing.id
                );
                return Ok(existing);
            }
            Ok(None) => {}
            Err(e) => warn!("Duplicate check failed, inserting anyway: {}", e),
        }

        let quest = self.repository.insert(new_quest).await?;
        info!("Created quest {} for organizer {}", quest.id, quest.organizer_uid);

        self.record_on_organizer(&quest).await;
        self.event_sink
            .emit(DomainEvent::quest_created(&quest.id, &quest.organizer_uid));
        Ok(quest)
    }

    fn get_quest(&self, quest_id: &str) -> Result<Quest> {
        require_field("questId", quest_id)?;
        self.repository
            .find_by_id(quest_id)?
            .ok_or_else(|| Error::NotFound(format!("Quest {} not found", quest_id)))
    }

    fn list_quests(&self) -> Result<Vec<Quest>> {
        self.repository.list_all()
    }

    fn list_quests_by_organizer(&self, organizer_uid: &str) -> Result<Vec<Quest>> {
        require_field("organizerUid", organizer_uid)?;
        match self
            .repository
            .list_by_organizer(organizer_uid, QuestOrder::CreatedDesc)
        {
            Err(e) if e.is_missing_index() => {
                warn!(
                    "Ordered organizer query unavailable ({}), falling back to unordered scan",
                    e
                );
                self.repository
                    .list_by_organizer(organizer_uid, QuestOrder::Unordered)
            }
            other => other,
        }
    }

    async fn update_quest(&self, caller_uid: &str, update: QuestUpdate) -> Result<Quest> {
        update.validate()?;
        self.load_as_organizer(&update.id, caller_uid, "edit")?;
        let quest = self.repository.update(update).await?;
        self.event_sink.emit(DomainEvent::quest_updated(&quest.id));
        Ok(quest)
    }

    async fn change_status(
        &self,
        quest_id: &str,
        caller_uid: &str,
        status: QuestStatus,
    ) -> Result<Quest> {
        let quest = self.load_as_organizer(quest_id, caller_uid, "change the status of")?;
        if quest.status == status {
            return Ok(quest);
        }
        quest.ensure_transition(status)?;

        // The store re-checks the move against its own read.
        let completed_at = (status == QuestStatus::Completed).then(Utc::now);
        let change = self
            .repository
            .set_status(quest_id, status, completed_at)
            .await?;
        if change.changed() {
            self.event_sink.emit(DomainEvent::quest_status_changed(
                quest_id,
                change.previous,
                status,
            ));
        }
        Ok(change.quest)
    }

    async fn delete_quest(&self, quest_id: &str, caller_uid: &str) -> Result<()> {
        self.load_as_organizer(quest_id, caller_uid, "delete")?;
        let deleted = self.repository.delete(quest_id).await?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Quest {} not found", quest_id)));
        }
        self.event_sink.emit(DomainEvent::quest_deleted(quest_id));
        Ok(())
    }

    fn subscribe(&self, callback: SnapshotCallback<Quest>) -> Subscription {
        self.repository.subscribe(callback)
    }
}
