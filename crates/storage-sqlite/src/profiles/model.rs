//! Database model for user profiles.

use diesel::prelude::*;

use questboard_core::errors::{Error, Result};
use questboard_core::profiles::UserProfile;

use crate::utils::{format_timestamp, from_json_column, parse_timestamp, to_json_column};

/// Database model for user profiles. The three quest id arrays and
/// `interests` are JSON text columns.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::user_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct UserProfileDB {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub personality_type: Option<String>,
    pub interests: String,
    pub is_profile_completed: bool,
    pub quests_created: String,
    pub quests_joined: String,
    pub saved_quests: String,
    pub total_quests_created: i64,
    pub total_quests_joined: i64,
    pub tokens: i64,
    pub level: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserProfileDB> for UserProfile {
    type Error = Error;

    fn try_from(db: UserProfileDB) -> Result<Self> {
        Ok(Self {
            id: db.id,
            email: db.email,
            username: db.username,
            display_name: db.display_name,
            age: db.age,
            city: db.city,
            gender: db.gender,
            bio: db.bio,
            personality_type: db.personality_type,
            interests: from_json_column("interests", &db.interests)?,
            is_profile_completed: db.is_profile_completed,
            quests_created: from_json_column("quests_created", &db.quests_created)?,
            quests_joined: from_json_column("quests_joined", &db.quests_joined)?,
            saved_quests: from_json_column("saved_quests", &db.saved_quests)?,
            total_quests_created: db.total_quests_created,
            total_quests_joined: db.total_quests_joined,
            tokens: db.tokens,
            level: db.level,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        })
    }
}

impl From<&UserProfile> for UserProfileDB {
    fn from(domain: &UserProfile) -> Self {
        Self {
            id: domain.id.clone(),
            email: domain.email.clone(),
            username: domain.username.clone(),
            display_name: domain.display_name.clone(),
            age: domain.age,
            city: domain.city.clone(),
            gender: domain.gender.clone(),
            bio: domain.bio.clone(),
            personality_type: domain.personality_type.clone(),
            interests: to_json_column(&domain.interests),
            is_profile_completed: domain.is_profile_completed,
            quests_created: to_json_column(&domain.quests_created),
            quests_joined: to_json_column(&domain.quests_joined),
            saved_quests: to_json_column(&domain.saved_quests),
            total_quests_created: domain.total_quests_created,
            total_quests_joined: domain.total_quests_joined,
            tokens: domain.tokens,
            level: domain.level,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }
}
