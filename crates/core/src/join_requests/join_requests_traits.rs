use std::collections::BTreeMap;

use async_trait::async_trait;

use super::join_requests_model::{JoinRequestState, JoinTransition, NewJoinRequest};
use crate::errors::Result;
use crate::quests::JoinRequest;

/// Trait defining the contract for the join-request workflow.
#[async_trait]
pub trait JoinRequestServiceTrait: Send + Sync {
    /// `none -> requested`. Written by the requester on their own behalf.
    async fn request_to_join(&self, request: NewJoinRequest) -> Result<JoinTransition>;

    /// `requested -> approved`. Organizer only.
    async fn approve(
        &self,
        quest_id: &str,
        caller_uid: &str,
        requester_uid: &str,
    ) -> Result<JoinTransition>;

    /// `requested -> rejected`. Organizer only.
    async fn reject(
        &self,
        quest_id: &str,
        caller_uid: &str,
        requester_uid: &str,
    ) -> Result<JoinTransition>;

    fn get_state(&self, quest_id: &str, requester_uid: &str) -> Result<JoinRequestState>;

    fn pending_requests(&self, quest_id: &str) -> Result<BTreeMap<String, JoinRequest>>;
}
