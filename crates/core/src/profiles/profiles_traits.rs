//! Profile repository and service traits.

use async_trait::async_trait;

use super::profiles_model::{ProfileArray, ProfileCounter, ProfileMerge, UserProfile};
use crate::errors::Result;

/// Trait defining the contract for profile document storage.
///
/// Array and counter mutations on a profile that has not been provisioned
/// fail with `Error::NotFound`.
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    /// Returns `None` when the profile has not been provisioned yet.
    fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>>;

    fn list_all(&self) -> Result<Vec<UserProfile>>;

    /// Creates the document if missing, then merges the supplied fields.
    async fn upsert_merge(&self, merge: ProfileMerge) -> Result<UserProfile>;

    /// Atomic array-union. Returns true if `value` was added.
    async fn array_union(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool>;

    /// Atomic array-remove. Returns true if `value` was present.
    async fn array_remove(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool>;

    /// Atomic increment. Returns the new value.
    async fn increment(&self, uid: &str, counter: ProfileCounter, delta: i64) -> Result<i64>;
}

/// Trait defining the contract for profile service operations.
#[async_trait]
pub trait ProfileServiceTrait: Send + Sync {
    async fn create_or_merge(&self, merge: ProfileMerge) -> Result<UserProfile>;

    /// `Ok(None)` means "not provisioned yet", which is not a failure.
    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Idempotent. Returns true if the quest was newly saved.
    async fn add_to_saved(&self, uid: &str, quest_id: &str) -> Result<bool>;

    /// Idempotent. Removing a quest that is not saved is a no-op.
    async fn remove_from_saved(&self, uid: &str, quest_id: &str) -> Result<bool>;

    async fn increment_counter(
        &self,
        uid: &str,
        counter: ProfileCounter,
        delta: i64,
    ) -> Result<i64>;
}
