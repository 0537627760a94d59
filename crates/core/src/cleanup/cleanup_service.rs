use std::collections::HashSet;
use std::sync::Arc;

use log::info;

use super::cleanup_model::CleanupReport;
use crate::badges::BadgeRepositoryTrait;
use crate::errors::Result;
use crate::profiles::{ProfileArray, ProfileRepositoryTrait};
use crate::quests::QuestRepositoryTrait;

/// Additive job removing dangling quest references left by hard deletes.
///
/// Counters are left untouched; they count history, not live quests.
pub struct ReferenceCleanupService {
    quest_repository: Arc<dyn QuestRepositoryTrait>,
    profile_repository: Arc<dyn ProfileRepositoryTrait>,
    badge_repository: Arc<dyn BadgeRepositoryTrait>,
}

impl ReferenceCleanupService {
    pub fn new(
        quest_repository: Arc<dyn QuestRepositoryTrait>,
        profile_repository: Arc<dyn ProfileRepositoryTrait>,
        badge_repository: Arc<dyn BadgeRepositoryTrait>,
    ) -> Self {
        Self {
            quest_repository,
            profile_repository,
            badge_repository,
        }
    }

    pub async fn sweep(&self) -> Result<CleanupReport> {
        // Profiles first: a quest created after this point cannot be
        // mistaken for a dangling reference.
        let profiles = self.profile_repository.list_all()?;
        let live: HashSet<String> = self
            .quest_repository
            .list_all()?
            .into_iter()
            .map(|q| q.id)
            .collect();

        let mut report = CleanupReport {
            profiles_scanned: profiles.len(),
            ..Default::default()
        };

        for profile in &profiles {
            let mut touched = false;
            for array in ProfileArray::ALL {
                let dangling: Vec<&String> = profile
                    .array(array)
                    .iter()
                    .filter(|id| !live.contains(*id))
                    .collect();
                for quest_id in dangling {
                    if self
                        .profile_repository
                        .array_remove(&profile.id, array, quest_id)
                        .await?
                    {
                        touched = true;
                        match array {
                            ProfileArray::SavedQuests => report.saved_removed += 1,
                            ProfileArray::QuestsJoined => report.joined_removed += 1,
                            ProfileArray::QuestsCreated => report.created_removed += 1,
                        }
                    }
                }
            }
            if touched {
                report.profiles_touched += 1;
            }
        }

        report.orphaned_badges = self
            .badge_repository
            .count_by_quest()?
            .into_iter()
            .filter(|(quest_id, _)| !live.contains(quest_id))
            .map(|(_, count)| count)
            .sum();

        info!(
            "Reference cleanup: {} references removed from {} profiles, {} orphaned badges",
            report.references_removed(),
            report.profiles_touched,
            report.orphaned_badges
        );
        Ok(report)
    }
}
