//! Badge ledger repository and service traits.

use std::collections::HashMap;

use async_trait::async_trait;

use super::badges_model::{Badge, BadgeStats, NewBadge};
use crate::errors::Result;

/// Append-only badge storage. Records are never updated or deleted.
///
/// All list queries are plain equality filters without pagination.
#[async_trait]
pub trait BadgeRepositoryTrait: Send + Sync {
    async fn append(&self, badge: Badge) -> Result<Badge>;

    fn list_by_quest(&self, quest_id: &str) -> Result<Vec<Badge>>;

    fn list_by_quest_and_giver(&self, quest_id: &str, giver_uid: &str) -> Result<Vec<Badge>>;

    fn list_by_quest_and_receiver(&self, quest_id: &str, receiver_uid: &str)
        -> Result<Vec<Badge>>;

    fn list_by_giver(&self, giver_uid: &str) -> Result<Vec<Badge>>;

    fn list_by_receiver(&self, receiver_uid: &str) -> Result<Vec<Badge>>;

    /// Number of badges per referenced quest id.
    fn count_by_quest(&self) -> Result<HashMap<String, usize>>;
}

/// Trait defining the contract for badge service operations.
#[async_trait]
pub trait BadgeServiceTrait: Send + Sync {
    /// Appends a badge awarded by `caller_uid`, then recomputes the quest's
    /// completion as a trailing best-effort step.
    async fn give_badge(&self, caller_uid: &str, new_badge: NewBadge) -> Result<Badge>;

    fn get_badges_for_quest(&self, quest_id: &str) -> Result<Vec<Badge>>;

    fn get_badges_given(&self, quest_id: &str, giver_uid: &str) -> Result<Vec<Badge>>;

    fn get_badges_received(&self, quest_id: &str, receiver_uid: &str) -> Result<Vec<Badge>>;

    fn get_user_badge_stats(&self, uid: &str) -> Result<BadgeStats>;
}
