use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

use super::completion_model::{count_distinct_givers, threshold_met, CompletionStatus};
use super::completion_traits::CompletionServiceTrait;
use crate::badges::BadgeRepositoryTrait;
use crate::errors::{require_field, Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::quests::{QuestRepositoryTrait, QuestStatus};

/// Writes `completed` back onto quests once enough participants gave badges.
pub struct CompletionService {
    quest_repository: Arc<dyn QuestRepositoryTrait>,
    badge_repository: Arc<dyn BadgeRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl CompletionService {
    pub fn new(
        quest_repository: Arc<dyn QuestRepositoryTrait>,
        badge_repository: Arc<dyn BadgeRepositoryTrait>,
    ) -> Self {
        Self {
            quest_repository,
            badge_repository,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }
}

#[async_trait]
impl CompletionServiceTrait for CompletionService {
    async fn recompute(&self, quest_id: &str) -> Result<Option<CompletionStatus>> {
        require_field("questId", quest_id)?;

        let Some(quest) = self.quest_repository.find_by_id(quest_id)? else {
            debug!("Skipping completion for {}: quest not stored", quest_id);
            return Ok(None);
        };
        if quest.participants.is_empty() {
            debug!("Skipping completion for {}: no participants", quest_id);
            return Ok(None);
        }

        let badges = self.badge_repository.list_by_quest(quest_id)?;
        let badges_given = count_distinct_givers(&badges);
        let participants = quest.participants.len();
        let met = threshold_met(badges_given, participants);

        let mut status = CompletionStatus {
            quest_id: quest_id.to_string(),
            badges_given,
            participants,
            completed: quest.status == QuestStatus::Completed,
            completed_at: quest.completed_at,
            newly_completed: false,
        };

        // Completed never reverts; cancelled is terminal too.
        if !met || quest.status.is_terminal() {
            return Ok(Some(status));
        }

        let now = Utc::now();
        let change = match self
            .quest_repository
            .set_status(quest_id, QuestStatus::Completed, Some(now))
            .await
        {
            Ok(change) => change,
            Err(Error::ConstraintViolation(reason)) => {
                debug!("Leaving quest {} as stored: {}", quest_id, reason);
                return Ok(Some(status));
            }
            Err(e) => return Err(e),
        };
        if !change.changed() {
            status.completed = true;
            status.completed_at = change.quest.completed_at;
            return Ok(Some(status));
        }
        info!(
            "Quest {} completed: {} distinct givers for {} participants",
            quest_id, badges_given, participants
        );
        self.event_sink.emit(DomainEvent::quest_completed(
            quest_id,
            badges_given,
            participants,
        ));

        status.completed = true;
        status.completed_at = change.quest.completed_at;
        status.newly_completed = true;
        Ok(Some(status))
    }
}
