//! In-memory repositories shared by the service tests.
//!
//! Each mock keeps its documents behind a mutex and exposes switches that
//! make subsequent calls fail the way a dropped connection would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::badges::{Badge, BadgeRepositoryTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::profiles::{ProfileArray, ProfileCounter, ProfileMerge, ProfileRepositoryTrait, UserProfile};
use crate::quests::{
    JoinRequest, NewQuest, Quest, QuestOrder, QuestRepositoryTrait, QuestStatus, QuestUpdate,
    StatusChange,
};
use crate::subscriptions::{ChangeFeed, SnapshotCallback, Subscription};
use crate::utils::{array_remove, array_union};

fn transport_failure(op: &str) -> Error {
    Error::Database(DatabaseError::QueryFailed(format!(
        "simulated transport failure during {}",
        op
    )))
}

fn check(flag: &AtomicBool, op: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(transport_failure(op));
    }
    Ok(())
}

/// Builds a stored quest with the given participants.
pub fn quest_with_roster(id: &str, organizer_uid: &str, participants: &[&str]) -> Quest {
    let mut quest = NewQuest {
        title: format!("Quest {}", id),
        location: "Central Park".to_string(),
        organizer_uid: organizer_uid.to_string(),
        ..Default::default()
    }
    .into_quest(id.to_string(), Utc::now());
    quest.participants = participants.iter().map(|p| p.to_string()).collect();
    quest
}

/// A profile that passes the join gating.
pub fn completed_profile(uid: &str) -> UserProfile {
    let mut profile = UserProfile::empty(uid, Utc::now());
    profile.display_name = Some(uid.to_uppercase());
    profile.is_profile_completed = true;
    profile
}

// --- Quests ---

pub struct InMemoryQuestRepository {
    quests: Mutex<Vec<Quest>>,
    feed: ChangeFeed<Quest>,
    index_ready: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_dedupe_lookup: AtomicBool,
    stale_reads: Mutex<HashMap<String, Quest>>,
}

impl Default for InMemoryQuestRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQuestRepository {
    pub fn new() -> Self {
        Self {
            quests: Mutex::new(Vec::new()),
            feed: ChangeFeed::new("quests"),
            index_ready: AtomicBool::new(true),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_dedupe_lookup: AtomicBool::new(false),
            stale_reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, quest: Quest) {
        self.quests.lock().unwrap().push(quest);
    }

    pub fn len(&self) -> usize {
        self.quests.lock().unwrap().len()
    }

    pub fn set_index_ready(&self, ready: bool) {
        self.index_ready.store(ready, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_dedupe_lookup(&self, fail: bool) {
        self.fail_dedupe_lookup.store(fail, Ordering::SeqCst);
    }

    /// Makes `find_by_id` keep returning this copy while writes see the
    /// stored document, as a reader racing a concurrent writer would.
    pub fn pin_stale_read(&self, quest: Quest) {
        self.stale_reads
            .lock()
            .unwrap()
            .insert(quest.id.clone(), quest);
    }

    fn snapshot(quests: &[Quest]) -> Vec<Quest> {
        quests.iter().rev().cloned().collect()
    }

    /// Applies `f` to a copy of one stored quest and keeps the copy only when
    /// `f` succeeds, then publishes the new snapshot.
    fn mutate<T>(
        &self,
        op: &str,
        quest_id: &str,
        f: impl FnOnce(&mut Quest) -> Result<T>,
    ) -> Result<T> {
        check(&self.fail_writes, op)?;
        let (out, snapshot) = {
            let mut quests = self.quests.lock().unwrap();
            let stored = quests
                .iter_mut()
                .find(|q| q.id == quest_id)
                .ok_or_else(|| Error::NotFound(format!("Quest {} not found", quest_id)))?;
            let mut quest = stored.clone();
            let out = f(&mut quest)?;
            *stored = quest;
            (out, Self::snapshot(&quests))
        };
        self.feed.publish(&snapshot);
        Ok(out)
    }
}

#[async_trait]
impl QuestRepositoryTrait for InMemoryQuestRepository {
    async fn insert(&self, new_quest: NewQuest) -> Result<Quest> {
        check(&self.fail_writes, "insert")?;
        let id = new_quest
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let quest = new_quest.into_quest(id, Utc::now());
        let snapshot = {
            let mut quests = self.quests.lock().unwrap();
            quests.push(quest.clone());
            Self::snapshot(&quests)
        };
        self.feed.publish(&snapshot);
        Ok(quest)
    }

    fn find_by_id(&self, quest_id: &str) -> Result<Option<Quest>> {
        check(&self.fail_reads, "find_by_id")?;
        if let Some(stale) = self.stale_reads.lock().unwrap().get(quest_id) {
            return Ok(Some(stale.clone()));
        }
        Ok(self
            .quests
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == quest_id)
            .cloned())
    }

    fn find_by_dedupe_key(&self, dedupe_key: &str) -> Result<Option<Quest>> {
        check(&self.fail_dedupe_lookup, "find_by_dedupe_key")?;
        check(&self.fail_reads, "find_by_dedupe_key")?;
        Ok(self
            .quests
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.dedupe_key() == dedupe_key)
            .cloned())
    }

    fn list_by_organizer(&self, organizer_uid: &str, order: QuestOrder) -> Result<Vec<Quest>> {
        check(&self.fail_reads, "list_by_organizer")?;
        let quests = self.quests.lock().unwrap();
        let mine = quests.iter().filter(|q| q.organizer_uid == organizer_uid);
        match order {
            QuestOrder::CreatedDesc => {
                if !self.index_ready.load(Ordering::SeqCst) {
                    return Err(Error::Database(DatabaseError::MissingIndex(
                        "quests(organizer_uid, created_at desc)".to_string(),
                    )));
                }
                Ok(mine.rev().cloned().collect())
            }
            QuestOrder::Unordered => Ok(mine.cloned().collect()),
        }
    }

    fn list_all(&self) -> Result<Vec<Quest>> {
        check(&self.fail_reads, "list_all")?;
        Ok(Self::snapshot(&self.quests.lock().unwrap()))
    }

    async fn update(&self, update: QuestUpdate) -> Result<Quest> {
        let quest_id = update.id.clone();
        self.mutate("update", &quest_id, |quest| {
            update.apply_to(quest, Utc::now());
            Ok(quest.clone())
        })
    }

    async fn set_status(
        &self,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<StatusChange> {
        self.mutate("set_status", quest_id, |quest| {
            quest.apply_status(status, completed_at, Utc::now())
        })
    }

    async fn put_join_request(
        &self,
        quest_id: &str,
        requester_uid: &str,
        request: JoinRequest,
    ) -> Result<()> {
        self.mutate("put_join_request", quest_id, |quest| {
            quest.put_join_request(requester_uid, request)
        })
    }

    async fn remove_join_request(&self, quest_id: &str, requester_uid: &str) -> Result<bool> {
        self.mutate("remove_join_request", quest_id, |quest| {
            Ok(quest.join_requests.remove(requester_uid).is_some())
        })
    }

    async fn add_participant(&self, quest_id: &str, uid: &str) -> Result<bool> {
        self.mutate("add_participant", quest_id, |quest| {
            Ok(array_union(&mut quest.participants, uid))
        })
    }

    async fn delete(&self, quest_id: &str) -> Result<usize> {
        check(&self.fail_writes, "delete")?;
        let (removed, snapshot) = {
            let mut quests = self.quests.lock().unwrap();
            let before = quests.len();
            quests.retain(|q| q.id != quest_id);
            (before - quests.len(), Self::snapshot(&quests))
        };
        if removed > 0 {
            self.feed.publish(&snapshot);
        }
        Ok(removed)
    }

    fn subscribe(&self, callback: SnapshotCallback<Quest>) -> Subscription {
        let initial = Self::snapshot(&self.quests.lock().unwrap());
        callback(&initial);
        self.feed.subscribe(callback)
    }
}

// --- Profiles ---

pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail_all_writes: AtomicBool,
    fail_array_union: AtomicBool,
    fail_increments: AtomicBool,
}

impl Default for InMemoryProfileRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            fail_all_writes: AtomicBool::new(false),
            fail_array_union: AtomicBool::new(false),
            fail_increments: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }

    pub fn fail_all_writes(&self, fail: bool) {
        self.fail_all_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_array_union(&self, fail: bool) {
        self.fail_array_union.store(fail, Ordering::SeqCst);
    }

    pub fn fail_increments(&self, fail: bool) {
        self.fail_increments.store(fail, Ordering::SeqCst);
    }

    fn mutate<T>(&self, uid: &str, f: impl FnOnce(&mut UserProfile) -> T) -> Result<T> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| Error::NotFound(format!("Profile {} not found", uid)))?;
        let out = f(profile);
        profile.updated_at = Utc::now();
        Ok(out)
    }
}

#[async_trait]
impl ProfileRepositoryTrait for InMemoryProfileRepository {
    fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().unwrap().get(uid).cloned())
    }

    fn list_all(&self) -> Result<Vec<UserProfile>> {
        let mut all: Vec<UserProfile> = self.profiles.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn upsert_merge(&self, merge: ProfileMerge) -> Result<UserProfile> {
        check(&self.fail_all_writes, "upsert_merge")?;
        let now = Utc::now();
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .entry(merge.id.clone())
            .or_insert_with(|| UserProfile::empty(merge.id.clone(), now));
        merge.apply_to(profile, now);
        Ok(profile.clone())
    }

    async fn array_union(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool> {
        check(&self.fail_all_writes, "array_union")?;
        check(&self.fail_array_union, "array_union")?;
        self.mutate(uid, |p| array_union(p.array_mut(array), value))
    }

    async fn array_remove(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool> {
        check(&self.fail_all_writes, "array_remove")?;
        self.mutate(uid, |p| array_remove(p.array_mut(array), value))
    }

    async fn increment(&self, uid: &str, counter: ProfileCounter, delta: i64) -> Result<i64> {
        check(&self.fail_all_writes, "increment")?;
        check(&self.fail_increments, "increment")?;
        self.mutate(uid, |p| {
            let value = p.counter_mut(counter);
            *value += delta;
            *value
        })
    }
}

// --- Badges ---

pub struct InMemoryBadgeRepository {
    badges: Mutex<Vec<Badge>>,
    fail_append: AtomicBool,
    fail_reads: AtomicBool,
}

impl Default for InMemoryBadgeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBadgeRepository {
    pub fn new() -> Self {
        Self {
            badges: Mutex::new(Vec::new()),
            fail_append: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, badge: Badge) {
        self.badges.lock().unwrap().push(badge);
    }

    pub fn len(&self) -> usize {
        self.badges.lock().unwrap().len()
    }

    pub fn fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn filter(&self, op: &str, pred: impl Fn(&Badge) -> bool) -> Result<Vec<Badge>> {
        check(&self.fail_reads, op)?;
        Ok(self
            .badges
            .lock()
            .unwrap()
            .iter()
            .filter(|b| pred(b))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BadgeRepositoryTrait for InMemoryBadgeRepository {
    async fn append(&self, badge: Badge) -> Result<Badge> {
        check(&self.fail_append, "append")?;
        self.badges.lock().unwrap().push(badge.clone());
        Ok(badge)
    }

    fn list_by_quest(&self, quest_id: &str) -> Result<Vec<Badge>> {
        self.filter("list_by_quest", |b| b.quest_id == quest_id)
    }

    fn list_by_quest_and_giver(&self, quest_id: &str, giver_uid: &str) -> Result<Vec<Badge>> {
        self.filter("list_by_quest_and_giver", |b| {
            b.quest_id == quest_id && b.giver_uid == giver_uid
        })
    }

    fn list_by_quest_and_receiver(
        &self,
        quest_id: &str,
        receiver_uid: &str,
    ) -> Result<Vec<Badge>> {
        self.filter("list_by_quest_and_receiver", |b| {
            b.quest_id == quest_id && b.receiver_uid == receiver_uid
        })
    }

    fn list_by_giver(&self, giver_uid: &str) -> Result<Vec<Badge>> {
        self.filter("list_by_giver", |b| b.giver_uid == giver_uid)
    }

    fn list_by_receiver(&self, receiver_uid: &str) -> Result<Vec<Badge>> {
        self.filter("list_by_receiver", |b| b.receiver_uid == receiver_uid)
    }

    fn count_by_quest(&self) -> Result<HashMap<String, usize>> {
        check(&self.fail_reads, "count_by_quest")?;
        let mut counts = HashMap::new();
        for badge in self.badges.lock().unwrap().iter() {
            *counts.entry(badge.quest_id.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
