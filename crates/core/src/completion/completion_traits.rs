use async_trait::async_trait;

use super::completion_model::CompletionStatus;
use crate::errors::Result;

/// Trait defining the contract for the completion engine.
#[async_trait]
pub trait CompletionServiceTrait: Send + Sync {
    /// Recomputes completion for `quest_id`.
    ///
    /// Returns `Ok(None)` when the quest (or its roster) is not available;
    /// badges may reference quests that were never persisted. The
    /// transition to completed is one-way.
    async fn recompute(&self, quest_id: &str) -> Result<Option<CompletionStatus>>;
}
