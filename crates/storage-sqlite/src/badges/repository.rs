use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use questboard_core::badges::{Badge, BadgeRepositoryTrait};
use questboard_core::errors::Result;

use super::model::BadgeDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::badges;
use crate::schema::badges::dsl::*;

/// Append-only: there is no update or delete path.
pub struct BadgeRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl BadgeRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        BadgeRepository { pool, writer }
    }

    fn load<F>(&self, filter: F) -> Result<Vec<Badge>>
    where
        F: FnOnce(badges::BoxedQuery<'static, diesel::sqlite::Sqlite>) -> badges::BoxedQuery<'static, diesel::sqlite::Sqlite>,
    {
        let mut conn = get_connection(&self.pool)?;
        let rows = filter(badges.into_boxed())
            .order(created_at.asc())
            .load::<BadgeDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Badge::from).collect())
    }
}

#[async_trait]
impl BadgeRepositoryTrait for BadgeRepository {
    async fn append(&self, badge: Badge) -> Result<Badge> {
        let row = BadgeDB::from(&badge);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(badges::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await?;
        Ok(badge)
    }

    fn list_by_quest(&self, quest: &str) -> Result<Vec<Badge>> {
        let quest = quest.to_string();
        self.load(move |q| q.filter(quest_id.eq(quest)))
    }

    fn list_by_quest_and_giver(&self, quest: &str, giver: &str) -> Result<Vec<Badge>> {
        let (quest, giver) = (quest.to_string(), giver.to_string());
        self.load(move |q| q.filter(quest_id.eq(quest)).filter(giver_uid.eq(giver)))
    }

    fn list_by_quest_and_receiver(&self, quest: &str, receiver: &str) -> Result<Vec<Badge>> {
        let (quest, receiver) = (quest.to_string(), receiver.to_string());
        self.load(move |q| {
            q.filter(quest_id.eq(quest))
                .filter(receiver_uid.eq(receiver))
        })
    }

    fn list_by_giver(&self, giver: &str) -> Result<Vec<Badge>> {
        let giver = giver.to_string();
        self.load(move |q| q.filter(giver_uid.eq(giver)))
    }

    fn list_by_receiver(&self, receiver: &str) -> Result<Vec<Badge>> {
        let receiver = receiver.to_string();
        self.load(move |q| q.filter(receiver_uid.eq(receiver)))
    }

    fn count_by_quest(&self) -> Result<HashMap<String, usize>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = badges
            .group_by(quest_id)
            .select((quest_id, count_star()))
            .load::<(String, i64)>(&mut conn)
            .into_core()?;
        Ok(rows
            .into_iter()
            .map(|(quest, count)| (quest, count as usize))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::Utc;
    use questboard_core::badges::{BadgeType, NewBadge};
    use tempfile::tempdir;

    async fn create_test_repository() -> (BadgeRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (BadgeRepository::new(pool, writer), temp_dir)
    }

    fn badge(id_text: &str, quest: &str, giver: &str, receiver: &str) -> Badge {
        NewBadge {
            quest_id: quest.to_string(),
            giver_uid: giver.to_string(),
            giver_name: giver.to_uppercase(),
            receiver_uid: receiver.to_string(),
            receiver_name: receiver.to_uppercase(),
            badge_type: BadgeType::Butterfly,
        }
        .into_badge(id_text.to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_equality_filters() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(badge("b1", "q1", "a", "b")).await.unwrap();
        repo.append(badge("b2", "q1", "a", "c")).await.unwrap();
        repo.append(badge("b3", "q1", "b", "a")).await.unwrap();
        repo.append(badge("b4", "q2", "a", "b")).await.unwrap();

        assert_eq!(repo.list_by_quest("q1").unwrap().len(), 3);
        assert_eq!(repo.list_by_quest_and_giver("q1", "a").unwrap().len(), 2);
        assert_eq!(repo.list_by_quest_and_receiver("q1", "a").unwrap().len(), 1);
        assert_eq!(repo.list_by_giver("a").unwrap().len(), 3);
        assert_eq!(repo.list_by_receiver("b").unwrap().len(), 2);

        let stored = &repo.list_by_quest_and_receiver("q1", "a").unwrap()[0];
        assert_eq!(stored.badge_name, "Social Butterfly");
        assert_eq!(stored.badge_type, BadgeType::Butterfly);
    }

    #[tokio::test]
    async fn test_count_by_quest_includes_unknown_quests() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(badge("b1", "never-stored", "a", "b")).await.unwrap();
        repo.append(badge("b2", "never-stored", "b", "a")).await.unwrap();

        let counts = repo.count_by_quest().unwrap();
        assert_eq!(counts.get("never-stored"), Some(&2));
    }

    #[tokio::test]
    async fn test_duplicate_badge_id_is_rejected() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(badge("b1", "q1", "a", "b")).await.unwrap();
        let err = repo.append(badge("b1", "q1", "a", "b")).await.unwrap_err();
        assert!(matches!(err, questboard_core::Error::ConstraintViolation(_)));
    }
}
