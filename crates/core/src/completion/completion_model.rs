//! Completion domain models and the distinct-giver rule.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::Badge;

/// Derived completion state for one quest. Never stored on its own; the only
/// persisted effect is `Quest.status = completed` plus `completedAt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub quest_id: String,
    /// Number of distinct users that gave at least one badge on the quest.
    pub badges_given: usize,
    pub participants: usize,
    /// Stored status is completed (either already, or flipped by this run).
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// True only for the run that performed the transition.
    pub newly_completed: bool,
}

/// Size of the set of distinct giver ids.
///
/// This is neither the number of distinct (giver, receiver) pairs nor a full
/// every-participant-to-every-other-participant check.
pub fn count_distinct_givers(badges: &[Badge]) -> usize {
    badges
        .iter()
        .map(|b| b.giver_uid.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// `badges_given >= participants`.
pub fn threshold_met(badges_given: usize, participants: usize) -> bool {
    badges_given >= participants
}
