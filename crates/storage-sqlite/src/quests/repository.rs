use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use questboard_core::errors::{DatabaseError, Error, Result};
use questboard_core::quests::{
    JoinRequest, NewQuest, Quest, QuestOrder, QuestRepositoryTrait, QuestStatus, QuestUpdate,
    StatusChange,
};
use questboard_core::subscriptions::{ChangeFeed, SnapshotCallback, Subscription};
use questboard_core::utils::array_union;

use super::model::QuestDB;
use crate::db::{get_connection, index_exists, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::quests;
use crate::schema::quests::dsl::*;

/// Index backing the newest-first organizer query.
pub const ORGANIZER_INDEX: &str = "idx_quests_organizer_created";

pub struct QuestRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
    feed: ChangeFeed<Quest>,
}

/// Loads one quest, applies `f`, writes the whole row back. Runs inside the
/// writer's transaction so the read-modify-write is atomic. An error from `f`
/// rolls the write back.
fn mutate_quest<T>(
    conn: &mut SqliteConnection,
    quest_id: &str,
    f: impl FnOnce(&mut Quest) -> Result<T>,
) -> Result<T> {
    let row = quests
        .find(quest_id)
        .first::<QuestDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| Error::NotFound(format!("Quest {} not found", quest_id)))?;
    let mut quest = Quest::try_from(row)?;
    let out = f(&mut quest)?;
    diesel::update(quests.find(quest_id))
        .set(&QuestDB::from(&quest))
        .execute(conn)
        .into_core()?;
    Ok(out)
}

impl QuestRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        QuestRepository {
            pool,
            writer,
            feed: ChangeFeed::new("quests"),
        }
    }

    fn load_all(&self) -> Result<Vec<Quest>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = quests
            .order((created_at.desc(), id.desc()))
            .load::<QuestDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(Quest::try_from).collect()
    }

    /// Pushes the fresh collection to listeners after a committed write.
    fn notify(&self) {
        if !self.feed.has_listeners() {
            return;
        }
        match self.load_all() {
            Ok(snapshot) => self.feed.publish(&snapshot),
            Err(e) => log::warn!("Skipping quest snapshot, reload failed: {}", e),
        }
    }

    async fn mutate<T, F>(&self, quest_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Quest) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let quest_id = quest_id.to_string();
        let out = self
            .writer
            .exec(move |conn: &mut SqliteConnection| mutate_quest(conn, &quest_id, f))
            .await?;
        self.notify();
        Ok(out)
    }
}

#[async_trait]
impl QuestRepositoryTrait for QuestRepository {
    async fn insert(&self, new_quest: NewQuest) -> Result<Quest> {
        let quest_id = new_quest
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let quest = new_quest.into_quest(quest_id, Utc::now());
        let row = QuestDB::from(&quest);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(quests::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await?;
        self.notify();
        Ok(quest)
    }

    fn find_by_id(&self, quest_id: &str) -> Result<Option<Quest>> {
        let mut conn = get_connection(&self.pool)?;
        let row = quests
            .find(quest_id)
            .first::<QuestDB>(&mut conn)
            .optional()
            .into_core()?;
        row.map(Quest::try_from).transpose()
    }

    fn find_by_dedupe_key(&self, key: &str) -> Result<Option<Quest>> {
        let mut conn = get_connection(&self.pool)?;
        let row = quests
            .filter(dedupe_key.eq(key))
            .order(created_at.asc())
            .first::<QuestDB>(&mut conn)
            .optional()
            .into_core()?;
        row.map(Quest::try_from).transpose()
    }

    fn list_by_organizer(&self, uid: &str, order: QuestOrder) -> Result<Vec<Quest>> {
        let mut conn = get_connection(&self.pool)?;
        let query = quests.filter(organizer_uid.eq(uid));
        let rows = match order {
            QuestOrder::CreatedDesc => {
                if !index_exists(&mut conn, ORGANIZER_INDEX)? {
                    return Err(Error::Database(DatabaseError::MissingIndex(
                        ORGANIZER_INDEX.to_string(),
                    )));
                }
                query
                    .order(created_at.desc())
                    .load::<QuestDB>(&mut conn)
                    .into_core()?
            }
            QuestOrder::Unordered => query.load::<QuestDB>(&mut conn).into_core()?,
        };
        rows.into_iter().map(Quest::try_from).collect()
    }

    fn list_all(&self) -> Result<Vec<Quest>> {
        self.load_all()
    }

    async fn update(&self, update: QuestUpdate) -> Result<Quest> {
        let quest_id = update.id.clone();
        self.mutate(&quest_id, move |quest| {
            update.apply_to(quest, Utc::now());
            Ok(quest.clone())
        })
        .await
    }

    async fn set_status(
        &self,
        quest_id: &str,
        new_status: QuestStatus,
        new_completed_at: Option<DateTime<Utc>>,
    ) -> Result<StatusChange> {
        self.mutate(quest_id, move |quest| {
            quest.apply_status(new_status, new_completed_at, Utc::now())
        })
        .await
    }

    async fn put_join_request(
        &self,
        quest_id: &str,
        requester_uid: &str,
        request: JoinRequest,
    ) -> Result<()> {
        let requester_uid = requester_uid.to_string();
        self.mutate(quest_id, move |quest| {
            quest.put_join_request(&requester_uid, request)
        })
        .await
    }

    async fn remove_join_request(&self, quest_id: &str, requester_uid: &str) -> Result<bool> {
        let requester_uid = requester_uid.to_string();
        self.mutate(quest_id, move |quest| {
            Ok(quest.join_requests.remove(&requester_uid).is_some())
        })
        .await
    }

    async fn add_participant(&self, quest_id: &str, uid: &str) -> Result<bool> {
        let uid = uid.to_string();
        self.mutate(quest_id, move |quest| Ok(array_union(&mut quest.participants, &uid)))
            .await
    }

    async fn delete(&self, quest_id: &str) -> Result<usize> {
        let quest_id = quest_id.to_string();
        let removed = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(quests.find(quest_id)).execute(conn).into_core()
            })
            .await?;
        if removed > 0 {
            self.notify();
        }
        Ok(removed)
    }

    fn subscribe(&self, callback: SnapshotCallback<Quest>) -> Subscription {
        match self.load_all() {
            Ok(initial) => callback(&initial),
            Err(e) => debug!("Initial quest snapshot unavailable: {}", e),
        }
        self.feed.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, get_connection, run_migrations, spawn_writer};
    use std::sync::Mutex;
    use tempfile::tempdir;

    async fn create_test_repository() -> (QuestRepository, Arc<crate::db::DbPool>, tempfile::TempDir)
    {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (QuestRepository::new(Arc::clone(&pool), writer), pool, temp_dir)
    }

    fn hike(title_text: &str) -> NewQuest {
        NewQuest {
            title: title_text.to_string(),
            location: "Monsanto".to_string(),
            organizer_uid: "org".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip_roster_columns() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Sunset hike")).await.unwrap();

        repo.add_participant(&quest.id, "a").await.unwrap();
        repo.put_join_request(
            &quest.id,
            "x",
            JoinRequest {
                name: "X".to_string(),
                message: Some("hi".to_string()),
                timestamp: Utc::now(),
            },
        )
        .await
        .unwrap();

        let stored = repo.find_by_id(&quest.id).unwrap().unwrap();
        assert_eq!(stored.participants, vec!["a"]);
        assert_eq!(stored.join_requests["x"].message.as_deref(), Some("hi"));
        assert_eq!(stored.status, QuestStatus::Published);
        assert_eq!(
            repo.find_by_dedupe_key(&quest.dedupe_key()).unwrap().unwrap().id,
            quest.id
        );
    }

    #[tokio::test]
    async fn test_add_participant_is_a_union() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Picnic")).await.unwrap();
        assert!(repo.add_participant(&quest.id, "a").await.unwrap());
        assert!(!repo.add_participant(&quest.id, "a").await.unwrap());
        assert_eq!(
            repo.find_by_id(&quest.id).unwrap().unwrap().participants,
            vec!["a"]
        );
    }

    #[tokio::test]
    async fn test_mutating_missing_quest_is_not_found() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let err = repo.add_participant("ghost", "a").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(repo.delete("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ordered_organizer_query_needs_index() {
        let (repo, pool, _dir) = create_test_repository().await;
        let first = repo.insert(hike("First")).await.unwrap();
        let second = repo.insert(hike("Second")).await.unwrap();

        let ordered = repo.list_by_organizer("org", QuestOrder::CreatedDesc).unwrap();
        assert_eq!(ordered[0].id, second.id);
        assert_eq!(ordered[1].id, first.id);

        let mut conn = get_connection(&pool).unwrap();
        diesel::sql_query(format!("DROP INDEX {}", ORGANIZER_INDEX))
            .execute(&mut conn)
            .unwrap();

        let err = repo
            .list_by_organizer("org", QuestOrder::CreatedDesc)
            .unwrap_err();
        assert!(err.is_missing_index());
        assert_eq!(
            repo.list_by_organizer("org", QuestOrder::Unordered).unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_set_status_keeps_completed_at() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Run")).await.unwrap();
        let done_at = Utc::now();
        let done = repo
            .set_status(&quest.id, QuestStatus::Completed, Some(done_at))
            .await
            .unwrap();
        assert!(done.changed());
        assert_eq!(done.quest.status, QuestStatus::Completed);

        let stored = repo.find_by_id(&quest.id).unwrap().unwrap();
        assert_eq!(stored.status, QuestStatus::Completed);
        assert_eq!(
            stored.completed_at.map(|t| t.timestamp_micros()),
            Some(done_at.timestamp_micros())
        );
    }

    #[tokio::test]
    async fn test_set_status_checks_the_stored_status() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Ride")).await.unwrap();
        let done_at = Utc::now();
        repo.set_status(&quest.id, QuestStatus::Completed, Some(done_at))
            .await
            .unwrap();

        let err = repo
            .set_status(&quest.id, QuestStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        let again = repo
            .set_status(&quest.id, QuestStatus::Completed, Some(Utc::now()))
            .await
            .unwrap();
        assert!(!again.changed());

        let stored = repo.find_by_id(&quest.id).unwrap().unwrap();
        assert_eq!(stored.status, QuestStatus::Completed);
        assert_eq!(
            stored.completed_at.map(|t| t.timestamp_micros()),
            Some(done_at.timestamp_micros())
        );
    }

    #[tokio::test]
    async fn test_put_join_request_refuses_participants() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Kayak")).await.unwrap();
        repo.add_participant(&quest.id, "a").await.unwrap();

        let err = repo
            .put_join_request(
                &quest.id,
                "a",
                JoinRequest {
                    name: "A".to_string(),
                    message: None,
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        let stored = repo.find_by_id(&quest.id).unwrap().unwrap();
        assert!(stored.join_requests.is_empty());
        assert!(stored.roster_is_disjoint());
    }

    #[tokio::test]
    async fn test_corrupt_roster_column_is_never_overwritten() {
        let (repo, pool, _dir) = create_test_repository().await;
        let quest = repo.insert(hike("Dive")).await.unwrap();
        let mut conn = get_connection(&pool).unwrap();
        diesel::update(quests.find(quest.id.as_str()))
            .set(participants.eq("not json"))
            .execute(&mut conn)
            .unwrap();

        assert!(repo.find_by_id(&quest.id).is_err());
        let err = repo.add_participant(&quest.id, "a").await.unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::Internal(_))));

        let raw: String = quests
            .find(quest.id.as_str())
            .select(participants)
            .first(&mut conn)
            .unwrap();
        assert_eq!(raw, "not json");
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots_after_writes() {
        let (repo, _pool, _dir) = create_test_repository().await;
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = repo.subscribe(Arc::new(move |snapshot: &[Quest]| {
            sink.lock().unwrap().push(snapshot.len());
        }));

        let quest = repo.insert(hike("Swim")).await.unwrap();
        repo.delete(&quest.id).await.unwrap();
        assert!(sub.unsubscribe());
        repo.insert(hike("Climb")).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0]);
    }
}
