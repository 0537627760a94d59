//! User profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::require_field;
use crate::Result;

/// Domain model representing a user profile document.
///
/// `id` equals the identity provider's user id. The quest id arrays are
/// denormalized references with no foreign-key enforcement, and the totals
/// are separate counters that are expected (not guaranteed) to track the
/// array lengths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub personality_type: Option<String>,
    pub interests: Vec<String>,
    pub is_profile_completed: bool,
    pub quests_created: Vec<String>,
    pub quests_joined: Vec<String>,
    pub saved_quests: Vec<String>,
    pub total_quests_created: i64,
    pub total_quests_joined: i64,
    pub tokens: i64,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh document for a user that has never been provisioned.
    pub fn empty(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            level: 1,
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    pub fn array(&self, array: ProfileArray) -> &Vec<String> {
        match array {
            ProfileArray::SavedQuests => &self.saved_quests,
            ProfileArray::QuestsJoined => &self.quests_joined,
            ProfileArray::QuestsCreated => &self.quests_created,
        }
    }

    pub fn array_mut(&mut self, array: ProfileArray) -> &mut Vec<String> {
        match array {
            ProfileArray::SavedQuests => &mut self.saved_quests,
            ProfileArray::QuestsJoined => &mut self.quests_joined,
            ProfileArray::QuestsCreated => &mut self.quests_created,
        }
    }

    pub fn counter(&self, counter: ProfileCounter) -> i64 {
        match counter {
            ProfileCounter::TotalQuestsCreated => self.total_quests_created,
            ProfileCounter::TotalQuestsJoined => self.total_quests_joined,
            ProfileCounter::Tokens => self.tokens,
        }
    }

    pub fn counter_mut(&mut self, counter: ProfileCounter) -> &mut i64 {
        match counter {
            ProfileCounter::TotalQuestsCreated => &mut self.total_quests_created,
            ProfileCounter::TotalQuestsJoined => &mut self.total_quests_joined,
            ProfileCounter::Tokens => &mut self.tokens,
        }
    }

    /// Whether both totals match their arrays. Drift is tolerated, never repaired.
    pub fn counters_consistent(&self) -> bool {
        self.total_quests_created == self.quests_created.len() as i64
            && self.total_quests_joined == self.quests_joined.len() as i64
    }
}

/// Id arrays on the profile that support atomic union/remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileArray {
    SavedQuests,
    QuestsJoined,
    QuestsCreated,
}

impl ProfileArray {
    pub const ALL: [ProfileArray; 3] = [
        ProfileArray::SavedQuests,
        ProfileArray::QuestsJoined,
        ProfileArray::QuestsCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileArray::SavedQuests => "savedQuests",
            ProfileArray::QuestsJoined => "questsJoined",
            ProfileArray::QuestsCreated => "questsCreated",
        }
    }
}

/// Numeric profile fields that support atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileCounter {
    TotalQuestsCreated,
    TotalQuestsJoined,
    Tokens,
}

impl ProfileCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileCounter::TotalQuestsCreated => "totalQuestsCreated",
            ProfileCounter::TotalQuestsJoined => "totalQuestsJoined",
            ProfileCounter::Tokens => "tokens",
        }
    }
}

/// Partial profile write. Only `Some` fields are written; everything else on
/// the stored document is left as is.
///
/// Arrays and totals are not part of a merge: they move only through the
/// atomic union/remove/increment operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileMerge {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub personality_type: Option<String>,
    pub interests: Option<Vec<String>>,
    pub is_profile_completed: Option<bool>,
    pub level: Option<i32>,
}

impl ProfileMerge {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_field("id", &self.id)
    }

    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(
                    if let Some(value) = &self.$field {
                        profile.$field = Some(value.clone());
                    }
                )*
            };
        }
        merge!(email, username, display_name, age, city, gender, bio, personality_type);

        if let Some(interests) = &self.interests {
            profile.interests = interests.clone();
        }
        if let Some(completed) = self.is_profile_completed {
            profile.is_profile_completed = completed;
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        profile.updated_at = now;
    }
}
