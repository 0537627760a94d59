use serde::{Deserialize, Serialize};

/// Outcome of one cleanup sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub profiles_scanned: usize,
    pub profiles_touched: usize,
    pub saved_removed: usize,
    pub joined_removed: usize,
    pub created_removed: usize,
    /// Badges pointing at quests that no longer exist. Reported, not deleted.
    pub orphaned_badges: usize,
}

impl CleanupReport {
    pub fn references_removed(&self) -> usize {
        self.saved_removed + self.joined_removed + self.created_removed
    }
}
