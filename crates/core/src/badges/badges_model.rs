//! Badge domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_field, ValidationError};
use crate::{Error, Result};

/// The four fixed badge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeType {
    Butterfly,
    Grass,
    Knight,
    Heart,
}

impl BadgeType {
    pub const ALL: [BadgeType; 4] = [
        BadgeType::Butterfly,
        BadgeType::Grass,
        BadgeType::Knight,
        BadgeType::Heart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeType::Butterfly => "butterfly",
            BadgeType::Grass => "grass",
            BadgeType::Knight => "knight",
            BadgeType::Heart => "heart",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BadgeType::Butterfly => "Social Butterfly",
            BadgeType::Grass => "Touch Grass",
            BadgeType::Knight => "Brave Knight",
            BadgeType::Heart => "Kind Heart",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BadgeType::Butterfly => "🦋",
            BadgeType::Grass => "🌱",
            BadgeType::Knight => "🛡️",
            BadgeType::Heart => "❤️",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeType::Butterfly => "Got everyone talking and made newcomers feel welcome",
            BadgeType::Grass => "Brought calm, grounded energy to the group",
            BadgeType::Knight => "Stepped up, led the way or helped when it mattered",
            BadgeType::Heart => "Was thoughtful and kind to everyone there",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BadgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown badge type '{}'",
                    s
                )))
            })
    }
}

/// Immutable ledger record: one giver awarding one receiver within one quest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub quest_id: String,
    pub giver_uid: String,
    pub giver_name: String,
    pub receiver_uid: String,
    pub receiver_name: String,
    pub badge_type: BadgeType,
    pub badge_name: String,
    pub badge_icon: String,
    pub badge_description: String,
    pub created_at: DateTime<Utc>,
}

/// Input model for awarding a badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBadge {
    pub quest_id: String,
    pub giver_uid: String,
    pub giver_name: String,
    pub receiver_uid: String,
    pub receiver_name: String,
    pub badge_type: BadgeType,
}

impl NewBadge {
    pub fn validate(&self) -> Result<()> {
        require_field("questId", &self.quest_id)?;
        require_field("giverUid", &self.giver_uid)?;
        require_field("receiverUid", &self.receiver_uid)?;
        Ok(())
    }

    /// Stamps id, timestamp and catalog text onto the record.
    pub fn into_badge(self, id: String, now: DateTime<Utc>) -> Badge {
        let badge_type = self.badge_type;
        Badge {
            id,
            quest_id: self.quest_id,
            giver_uid: self.giver_uid,
            giver_name: self.giver_name,
            receiver_uid: self.receiver_uid,
            receiver_name: self.receiver_name,
            badge_type,
            badge_name: badge_type.display_name().to_string(),
            badge_icon: badge_type.icon().to_string(),
            badge_description: badge_type.description().to_string(),
            created_at: now,
        }
    }
}

/// Per-user badge totals across all quests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStats {
    pub uid: String,
    pub given_total: usize,
    pub received_total: usize,
    pub given_by_type: BTreeMap<BadgeType, usize>,
    pub received_by_type: BTreeMap<BadgeType, usize>,
}

impl BadgeStats {
    /// Folds the two query results into per-type counts.
    pub fn from_ledger(uid: &str, given: &[Badge], received: &[Badge]) -> Self {
        fn by_type(badges: &[Badge]) -> BTreeMap<BadgeType, usize> {
            let mut counts = BTreeMap::new();
            for badge in badges {
                *counts.entry(badge.badge_type).or_insert(0) += 1;
            }
            counts
        }

        Self {
            uid: uid.to_string(),
            given_total: given.len(),
            received_total: received.len(),
            given_by_type: by_type(given),
            received_by_type: by_type(received),
        }
    }
}
