use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use super::badges_model::{Badge, BadgeStats, NewBadge};
use super::badges_traits::{BadgeRepositoryTrait, BadgeServiceTrait};
use crate::completion::CompletionServiceTrait;
use crate::errors::{require_field, Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::saga::SagaTracker;

/// Service for the badge ledger.
pub struct BadgeService {
    repository: Arc<dyn BadgeRepositoryTrait>,
    completion_service: Arc<dyn CompletionServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl BadgeService {
    pub fn new(
        repository: Arc<dyn BadgeRepositoryTrait>,
        completion_service: Arc<dyn CompletionServiceTrait>,
    ) -> Self {
        Self {
            repository,
            completion_service,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }
}

#[async_trait]
impl BadgeServiceTrait for BadgeService {
    async fn give_badge(&self, caller_uid: &str, new_badge: NewBadge) -> Result<Badge> {
        new_badge.validate()?;
        if caller_uid != new_badge.giver_uid {
            return Err(Error::PermissionDenied(
                "Badges can only be given in your own name".to_string(),
            ));
        }

        let badge = new_badge.into_badge(Uuid::new_v4().to_string(), Utc::now());
        let mut saga = SagaTracker::new("give_badge", badge.id.as_str());
        let badge = saga.record("append_badge", self.repository.append(badge).await)?;

        self.event_sink.emit(DomainEvent::BadgeGiven {
            badge_id: badge.id.clone(),
            quest_id: badge.quest_id.clone(),
            giver_uid: badge.giver_uid.clone(),
            receiver_uid: badge.receiver_uid.clone(),
            badge_type: badge.badge_type,
        });

        // The badge is already persisted; completion is allowed to lag.
        if let Some(None) = saga.record_best_effort(
            "recompute_completion",
            self.completion_service.recompute(&badge.quest_id).await,
        ) {
            debug!(
                "Quest {} not available for completion, badge {} kept",
                badge.quest_id, badge.id
            );
        }

        Ok(badge)
    }

    fn get_badges_for_quest(&self, quest_id: &str) -> Result<Vec<Badge>> {
        require_field("questId", quest_id)?;
        self.repository.list_by_quest(quest_id)
    }

    fn get_badges_given(&self, quest_id: &str, giver_uid: &str) -> Result<Vec<Badge>> {
        require_field("questId", quest_id)?;
        require_field("giverUid", giver_uid)?;
        self.repository.list_by_quest_and_giver(quest_id, giver_uid)
    }

    fn get_badges_received(&self, quest_id: &str, receiver_uid: &str) -> Result<Vec<Badge>> {
        require_field("questId", quest_id)?;
        require_field("receiverUid", receiver_uid)?;
        self.repository
            .list_by_quest_and_receiver(quest_id, receiver_uid)
    }

    fn get_user_badge_stats(&self, uid: &str) -> Result<BadgeStats> {
        require_field("uid", uid)?;
        let given = self.repository.list_by_giver(uid)?;
        let received = self.repository.list_by_receiver(uid)?;
        Ok(BadgeStats::from_ledger(uid, &given, &received))
    }
}
