//! Quest domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{require_field, ValidationError};
use crate::{Error, Result};

/// Lifecycle status of a quest.
///
/// Forward machine: draft -> published -> active -> completed. Cancelled is
/// reachable from every non-completed state. Completed and cancelled are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Draft,
    #[default]
    Published,
    Active,
    Completed,
    Cancelled,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Draft => "draft",
            QuestStatus::Published => "published",
            QuestStatus::Active => "active",
            QuestStatus::Completed => "completed",
            QuestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            QuestStatus::Draft => 0,
            QuestStatus::Published => 1,
            QuestStatus::Active => 2,
            QuestStatus::Completed => 3,
            QuestStatus::Cancelled => 4,
        }
    }

    /// Whether the machine allows moving from `self` to `next`.
    ///
    /// Forward skips (draft -> active) are allowed; going back never is.
    pub fn can_transition_to(&self, next: QuestStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            QuestStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(QuestStatus::Draft),
            "published" => Ok(QuestStatus::Published),
            "active" => Ok(QuestStatus::Active),
            "completed" => Ok(QuestStatus::Completed),
            "cancelled" => Ok(QuestStatus::Cancelled),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown quest status '{}'",
                other
            )))),
        }
    }
}

/// Pending application written by the requester into `Quest::join_requests`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub name: String,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Domain model representing a quest document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: String,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    /// Free-form start time as entered by the organizer ("19:30", "7pm").
    pub time: Option<String>,
    pub cost: Option<Decimal>,
    pub organizer_uid: String,
    /// Organizer display name, denormalized at creation.
    pub organizer: Option<String>,
    pub status: QuestStatus,
    pub participants: Vec<String>,
    pub join_requests: BTreeMap<String, JoinRequest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn is_organizer(&self, uid: &str) -> bool {
        self.organizer_uid == uid
    }

    pub fn is_participant(&self, uid: &str) -> bool {
        self.participants.iter().any(|p| p == uid)
    }

    pub fn has_join_request(&self, uid: &str) -> bool {
        self.join_requests.contains_key(uid)
    }

    /// True when no user is both pending and a participant.
    pub fn roster_is_disjoint(&self) -> bool {
        !self
            .participants
            .iter()
            .any(|p| self.join_requests.contains_key(p))
    }

    pub fn dedupe_key(&self) -> String {
        quest_dedupe_key(&self.title, &self.organizer_uid, &self.location)
    }

    /// Fails when `uid` may not hold a pending request on this quest.
    pub fn ensure_accepts_join_request(&self, uid: &str) -> Result<()> {
        if self.is_organizer(uid) {
            return Err(Error::ConstraintViolation(
                "Organizers cannot request to join their own quest".to_string(),
            ));
        }
        if self.is_participant(uid) {
            return Err(Error::ConstraintViolation(format!(
                "User {} is already a participant of quest {}",
                uid, self.id
            )));
        }
        if self.status.is_terminal() {
            return Err(Error::ConstraintViolation(format!(
                "Quest {} is {} and no longer accepts requests",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Writes (or overwrites) the pending entry for `uid`, keeping the roster
    /// disjoint.
    pub fn put_join_request(&mut self, uid: &str, request: JoinRequest) -> Result<()> {
        self.ensure_accepts_join_request(uid)?;
        self.join_requests.insert(uid.to_string(), request);
        Ok(())
    }

    /// Fails with `ConstraintViolation` when the machine forbids `self.status -> next`.
    pub fn ensure_transition(&self, next: QuestStatus) -> Result<()> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }
        Err(Error::ConstraintViolation(format!(
            "Quest {} cannot move from '{}' to '{}'",
            self.id, self.status, next
        )))
    }

    /// Moves the quest to `next`. Re-applying the current status is a no-op.
    pub fn apply_status(
        &mut self,
        next: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<StatusChange> {
        let previous = self.status;
        if previous != next {
            self.ensure_transition(next)?;
            self.status = next;
            if completed_at.is_some() {
                self.completed_at = completed_at;
            }
            self.updated_at = now;
        }
        Ok(StatusChange {
            previous,
            quest: self.clone(),
        })
    }
}

/// Result of a guarded status write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// Status read inside the same write.
    pub previous: QuestStatus,
    pub quest: Quest,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.quest.status
    }
}

/// Fingerprint of the (title, organizer, location) triple used by the
/// best-effort duplicate check on create.
pub fn quest_dedupe_key(title: &str, organizer_uid: &str, location: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [title, organizer_uid, location] {
        let field = field.trim();
        // Length prefix keeps field boundaries unambiguous.
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Input model for creating a new quest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewQuest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: String,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub cost: Option<Decimal>,
    pub organizer_uid: String,
    pub organizer: Option<String>,
    pub status: Option<QuestStatus>,
}

impl NewQuest {
    /// Validates required fields. Runs before any store call.
    pub fn validate(&self) -> Result<()> {
        require_field("title", &self.title)?;
        require_field("organizerUid", &self.organizer_uid)?;
        require_field("location", &self.location)?;
        if let Some(status) = self.status {
            if status.is_terminal() {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "A new quest cannot start as '{}'",
                    status
                ))));
            }
        }
        if let Some(cost) = self.cost {
            if cost.is_sign_negative() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Cost cannot be negative".to_string(),
                )));
            }
        }
        Ok(())
    }

    pub fn dedupe_key(&self) -> String {
        quest_dedupe_key(&self.title, &self.organizer_uid, &self.location)
    }

    /// Builds the stored document. Participants and join requests start empty.
    pub fn into_quest(self, id: String, now: DateTime<Utc>) -> Quest {
        Quest {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category,
            location: self.location.trim().to_string(),
            city: self.city,
            date: self.date,
            time: self.time,
            cost: self.cost,
            organizer_uid: self.organizer_uid.trim().to_string(),
            organizer: self.organizer,
            status: self.status.unwrap_or_default(),
            participants: Vec::new(),
            join_requests: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Partial update of editable quest fields. `None` leaves a field untouched.
///
/// Status, participants and join requests are deliberately absent: they move
/// only through the status machine and the join-request workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestUpdate {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub cost: Option<Decimal>,
}

impl QuestUpdate {
    pub fn validate(&self) -> Result<()> {
        require_field("id", &self.id)?;
        if let Some(title) = &self.title {
            require_field("title", title)?;
        }
        if let Some(location) = &self.location {
            require_field("location", location)?;
        }
        Ok(())
    }

    /// Overwrites the supplied fields on `quest` (last write wins).
    pub fn apply_to(&self, quest: &mut Quest, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            quest.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            quest.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            quest.category = Some(category.clone());
        }
        if let Some(location) = &self.location {
            quest.location = location.trim().to_string();
        }
        if let Some(city) = &self.city {
            quest.city = Some(city.clone());
        }
        if let Some(date) = self.date {
            quest.date = Some(date);
        }
        if let Some(time) = &self.time {
            quest.time = Some(time.clone());
        }
        if let Some(cost) = self.cost {
            quest.cost = Some(cost);
        }
        quest.updated_at = now;
    }
}

/// Requested ordering for organizer queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestOrder {
    /// Newest first. Needs the organizer/creation index.
    CreatedDesc,
    /// Store order, no index required.
    Unordered,
}
