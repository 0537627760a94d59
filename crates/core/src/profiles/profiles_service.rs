use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::profiles_model::{ProfileArray, ProfileCounter, ProfileMerge, UserProfile};
use super::profiles_traits::{ProfileRepositoryTrait, ProfileServiceTrait};
use crate::errors::{require_field, Result};

/// Service for managing user profiles.
pub struct ProfileService {
    repository: Arc<dyn ProfileRepositoryTrait>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ProfileServiceTrait for ProfileService {
    async fn create_or_merge(&self, merge: ProfileMerge) -> Result<UserProfile> {
        merge.validate()?;
        debug!("Merging profile fields for {}", merge.id);
        self.repository.upsert_merge(merge).await
    }

    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        require_field("uid", uid)?;
        self.repository.find_by_id(uid)
    }

    async fn add_to_saved(&self, uid: &str, quest_id: &str) -> Result<bool> {
        require_field("uid", uid)?;
        require_field("questId", quest_id)?;
        self.repository
            .array_union(uid, ProfileArray::SavedQuests, quest_id)
            .await
    }

    async fn remove_from_saved(&self, uid: &str, quest_id: &str) -> Result<bool> {
        require_field("uid", uid)?;
        require_field("questId", quest_id)?;
        self.repository
            .array_remove(uid, ProfileArray::SavedQuests, quest_id)
            .await
    }

    async fn increment_counter(
        &self,
        uid: &str,
        counter: ProfileCounter,
        delta: i64,
    ) -> Result<i64> {
        require_field("uid", uid)?;
        self.repository.increment(uid, counter, delta).await
    }
}
