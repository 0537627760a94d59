use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};

use super::join_requests_model::{JoinRequestState, JoinTransition, NewJoinRequest};
use super::join_requests_traits::JoinRequestServiceTrait;
use crate::errors::{require_field, Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::profiles::{ProfileArray, ProfileCounter, ProfileRepositoryTrait};
use crate::quests::{JoinRequest, Quest, QuestRepositoryTrait};
use crate::saga::SagaTracker;

const APPROVE_SAGA: &str = "approve_join_request";

/// Drives join requests across the quest and profile documents.
///
/// Writes are independent store calls. Approval is a four-step saga whose
/// steps are each idempotent, so a failed approval can simply be re-invoked.
pub struct JoinRequestService {
    quest_repository: Arc<dyn QuestRepositoryTrait>,
    profile_repository: Arc<dyn ProfileRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl JoinRequestService {
    pub fn new(
        quest_repository: Arc<dyn QuestRepositoryTrait>,
        profile_repository: Arc<dyn ProfileRepositoryTrait>,
    ) -> Self {
        Self {
            quest_repository,
            profile_repository,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn load_quest(&self, quest_id: &str) -> Result<Quest> {
        self.quest_repository
            .find_by_id(quest_id)?
            .ok_or_else(|| Error::NotFound(format!("Quest {} not found", quest_id)))
    }

    fn load_as_organizer(&self, quest_id: &str, caller_uid: &str) -> Result<Quest> {
        require_field("questId", quest_id)?;
        let quest = self.load_quest(quest_id)?;
        if !quest.is_organizer(caller_uid) {
            return Err(Error::PermissionDenied(
                "Only the organizer can decide on join requests".to_string(),
            ));
        }
        Ok(quest)
    }

    /// Profiles must exist and be completed before a user can apply.
    fn ensure_profile_completed(&self, uid: &str) -> Result<()> {
        match self.profile_repository.find_by_id(uid)? {
            Some(profile) if profile.is_profile_completed => Ok(()),
            _ => Err(Error::ConstraintViolation(
                "Complete your profile before requesting to join quests".to_string(),
            )),
        }
    }
}

#[async_trait]
impl JoinRequestServiceTrait for JoinRequestService {
    async fn request_to_join(&self, request: NewJoinRequest) -> Result<JoinTransition> {
        request.validate()?;
        let quest = self.load_quest(&request.quest_id)?;

        quest.ensure_accepts_join_request(&request.requester_uid)?;
        self.ensure_profile_completed(&request.requester_uid)?;

        let entry = JoinRequest {
            name: request.requester_name,
            message: request.message,
            timestamp: Utc::now(),
        };
        // Re-checked by the store against its own read.
        self.quest_repository
            .put_join_request(&quest.id, &request.requester_uid, entry)
            .await?;

        debug!(
            "User {} requested to join quest {}",
            request.requester_uid, quest.id
        );
        self.event_sink
            .emit(DomainEvent::join_requested(&quest.id, &request.requester_uid));
        Ok(JoinTransition {
            quest_id: quest.id,
            requester_uid: request.requester_uid,
            state: JoinRequestState::Requested,
            resumed: false,
        })
    }

    async fn approve(
        &self,
        quest_id: &str,
        caller_uid: &str,
        requester_uid: &str,
    ) -> Result<JoinTransition> {
        require_field("requesterUid", requester_uid)?;
        let quest = self.load_as_organizer(quest_id, caller_uid)?;

        let pending = quest.has_join_request(requester_uid);
        let resumed = quest.is_participant(requester_uid);
        if !pending && !resumed {
            return Err(Error::ConstraintViolation(format!(
                "No pending join request from {} on quest {}",
                requester_uid, quest_id
            )));
        }

        let mut saga = SagaTracker::new(APPROVE_SAGA, format!("{}/{}", quest_id, requester_uid));
        saga.record(
            "add_participant",
            self.quest_repository
                .add_participant(quest_id, requester_uid)
                .await,
        )?;
        saga.record(
            "remove_join_request",
            self.quest_repository
                .remove_join_request(quest_id, requester_uid)
                .await,
        )?;
        // The counter only moves when the array did, so a retry after a
        // partial run never counts the same quest twice.
        let appended = saga.record(
            "append_quests_joined",
            self.profile_repository
                .array_union(requester_uid, ProfileArray::QuestsJoined, quest_id)
                .await,
        )?;
        if appended {
            saga.record(
                "increment_total_quests_joined",
                self.profile_repository
                    .increment(requester_uid, ProfileCounter::TotalQuestsJoined, 1)
                    .await,
            )?;
        }

        info!(
            "Approved {} for quest {}{}",
            requester_uid,
            quest_id,
            if resumed { " (resumed)" } else { "" }
        );
        self.event_sink
            .emit(DomainEvent::join_approved(quest_id, requester_uid));
        Ok(JoinTransition {
            quest_id: quest_id.to_string(),
            requester_uid: requester_uid.to_string(),
            state: JoinRequestState::Approved,
            resumed,
        })
    }

    async fn reject(
        &self,
        quest_id: &str,
        caller_uid: &str,
        requester_uid: &str,
    ) -> Result<JoinTransition> {
        require_field("requesterUid", requester_uid)?;
        let quest = self.load_as_organizer(quest_id, caller_uid)?;
        if !quest.has_join_request(requester_uid) {
            return Err(Error::ConstraintViolation(format!(
                "No pending join request from {} on quest {}",
                requester_uid, quest_id
            )));
        }

        self.quest_repository
            .remove_join_request(quest_id, requester_uid)
            .await?;

        debug!("Rejected {} for quest {}", requester_uid, quest_id);
        self.event_sink
            .emit(DomainEvent::join_rejected(quest_id, requester_uid));
        Ok(JoinTransition {
            quest_id: quest_id.to_string(),
            requester_uid: requester_uid.to_string(),
            state: JoinRequestState::Rejected,
            resumed: false,
        })
    }

    fn get_state(&self, quest_id: &str, requester_uid: &str) -> Result<JoinRequestState> {
        require_field("questId", quest_id)?;
        require_field("requesterUid", requester_uid)?;
        let quest = self.load_quest(quest_id)?;
        Ok(if quest.is_participant(requester_uid) {
            JoinRequestState::Approved
        } else if quest.has_join_request(requester_uid) {
            JoinRequestState::Requested
        } else {
            JoinRequestState::None
        })
    }

    fn pending_requests(&self, quest_id: &str) -> Result<BTreeMap<String, JoinRequest>> {
        require_field("questId", quest_id)?;
        Ok(self.load_quest(quest_id)?.join_requests)
    }
}
