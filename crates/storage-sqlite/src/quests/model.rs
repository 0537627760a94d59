//! Database model for quests.

use diesel::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use questboard_core::errors::{Error, Result};
use questboard_core::quests::{JoinRequest, Quest, QuestStatus};

use crate::utils::{
    format_date, format_timestamp, from_json_column, parse_date, parse_timestamp, to_json_column,
};

/// Database model for quests. `participants` and `join_requests` are JSON
/// text columns.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::quests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct QuestDB {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: String,
    pub city: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub cost: Option<String>,
    pub organizer_uid: String,
    pub organizer: Option<String>,
    pub status: String,
    pub participants: String,
    pub join_requests: String,
    pub dedupe_key: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl TryFrom<QuestDB> for Quest {
    type Error = Error;

    fn try_from(db: QuestDB) -> Result<Self> {
        let status = QuestStatus::from_str(&db.status).unwrap_or_else(|_| {
            log::error!("Quest {} has unknown status '{}'", db.id, db.status);
            QuestStatus::default()
        });
        let join_requests: BTreeMap<String, JoinRequest> =
            from_json_column("join_requests", &db.join_requests)?;
        let participants: Vec<String> = from_json_column("participants", &db.participants)?;
        Ok(Self {
            id: db.id,
            title: db.title,
            description: db.description,
            category: db.category,
            location: db.location,
            city: db.city,
            date: db.event_date.as_deref().and_then(parse_date),
            time: db.event_time,
            cost: db.cost.as_deref().and_then(|c| Decimal::from_str(c).ok()),
            organizer_uid: db.organizer_uid,
            organizer: db.organizer,
            status,
            participants,
            join_requests,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
            completed_at: db.completed_at.as_deref().map(parse_timestamp),
        })
    }
}

impl From<&Quest> for QuestDB {
    fn from(domain: &Quest) -> Self {
        Self {
            id: domain.id.clone(),
            title: domain.title.clone(),
            description: domain.description.clone(),
            category: domain.category.clone(),
            location: domain.location.clone(),
            city: domain.city.clone(),
            event_date: domain.date.map(format_date),
            event_time: domain.time.clone(),
            cost: domain.cost.map(|c| c.to_string()),
            organizer_uid: domain.organizer_uid.clone(),
            organizer: domain.organizer.clone(),
            status: domain.status.as_str().to_string(),
            participants: to_json_column(&domain.participants),
            join_requests: to_json_column(&domain.join_requests),
            dedupe_key: domain.dedupe_key(),
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
            completed_at: domain.completed_at.map(format_timestamp),
        }
    }
}
