//! Database model for badges.

use diesel::prelude::*;
use std::str::FromStr;

use questboard_core::badges::{Badge, BadgeType};

use crate::utils::{format_timestamp, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::badges)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BadgeDB {
    pub id: String,
    pub quest_id: String,
    pub giver_uid: String,
    pub giver_name: String,
    pub receiver_uid: String,
    pub receiver_name: String,
    pub badge_type: String,
    pub badge_name: String,
    pub badge_icon: String,
    pub badge_description: String,
    pub created_at: String,
}

impl From<BadgeDB> for Badge {
    fn from(db: BadgeDB) -> Self {
        let badge_type = BadgeType::from_str(&db.badge_type).unwrap_or_else(|_| {
            log::error!("Badge {} has unknown type '{}'", db.id, db.badge_type);
            BadgeType::Heart
        });
        Self {
            id: db.id,
            quest_id: db.quest_id,
            giver_uid: db.giver_uid,
            giver_name: db.giver_name,
            receiver_uid: db.receiver_uid,
            receiver_name: db.receiver_name,
            badge_type,
            badge_name: db.badge_name,
            badge_icon: db.badge_icon,
            badge_description: db.badge_description,
            created_at: parse_timestamp(&db.created_at),
        }
    }
}

impl From<&Badge> for BadgeDB {
    fn from(domain: &Badge) -> Self {
        Self {
            id: domain.id.clone(),
            quest_id: domain.quest_id.clone(),
            giver_uid: domain.giver_uid.clone(),
            giver_name: domain.giver_name.clone(),
            receiver_uid: domain.receiver_uid.clone(),
            receiver_name: domain.receiver_name.clone(),
            badge_type: domain.badge_type.as_str().to_string(),
            badge_name: domain.badge_name.clone(),
            badge_icon: domain.badge_icon.clone(),
            badge_description: domain.badge_description.clone(),
            created_at: format_timestamp(domain.created_at),
        }
    }
}
