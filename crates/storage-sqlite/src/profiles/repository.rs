use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use questboard_core::errors::{Error, Result};
use questboard_core::profiles::{
    ProfileArray, ProfileCounter, ProfileMerge, ProfileRepositoryTrait, UserProfile,
};
use questboard_core::utils::{array_remove, array_union};

use super::model::UserProfileDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::user_profiles;
use crate::schema::user_profiles::dsl::*;

pub struct ProfileRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

fn load_profile(conn: &mut SqliteConnection, uid: &str) -> Result<Option<UserProfile>> {
    let row = user_profiles
        .find(uid)
        .first::<UserProfileDB>(conn)
        .optional()
        .into_core()?;
    row.map(UserProfile::try_from).transpose()
}

fn save_profile(conn: &mut SqliteConnection, profile: &UserProfile) -> Result<()> {
    diesel::update(user_profiles.find(&profile.id))
        .set(&UserProfileDB::from(profile))
        .execute(conn)
        .into_core()?;
    Ok(())
}

impl ProfileRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProfileRepository { pool, writer }
    }

    /// Read-modify-write of one existing profile on the writer connection.
    async fn mutate<T, F>(&self, uid: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut UserProfile) -> T + Send + 'static,
        T: Send + 'static,
    {
        let uid = uid.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<T> {
                let mut profile = load_profile(conn, &uid)?
                    .ok_or_else(|| Error::NotFound(format!("Profile {} not found", uid)))?;
                let out = f(&mut profile);
                profile.updated_at = Utc::now();
                save_profile(conn, &profile)?;
                Ok(out)
            })
            .await
    }
}

#[async_trait]
impl ProfileRepositoryTrait for ProfileRepository {
    fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>> {
        let mut conn = get_connection(&self.pool)?;
        load_profile(&mut conn, uid)
    }

    fn list_all(&self) -> Result<Vec<UserProfile>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = user_profiles
            .order(id.asc())
            .load::<UserProfileDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(UserProfile::try_from).collect()
    }

    async fn upsert_merge(&self, merge: ProfileMerge) -> Result<UserProfile> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<UserProfile> {
                let now = Utc::now();
                let (mut profile, exists) = match load_profile(conn, &merge.id)? {
                    Some(existing) => (existing, true),
                    None => (UserProfile::empty(merge.id.clone(), now), false),
                };
                merge.apply_to(&mut profile, now);
                if exists {
                    save_profile(conn, &profile)?;
                } else {
                    diesel::insert_into(user_profiles::table)
                        .values(&UserProfileDB::from(&profile))
                        .execute(conn)
                        .into_core()?;
                }
                Ok(profile)
            })
            .await
    }

    async fn array_union(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool> {
        let value = value.to_string();
        self.mutate(uid, move |p| array_union(p.array_mut(array), &value))
            .await
    }

    async fn array_remove(&self, uid: &str, array: ProfileArray, value: &str) -> Result<bool> {
        let value = value.to_string();
        self.mutate(uid, move |p| array_remove(p.array_mut(array), &value))
            .await
    }

    async fn increment(&self, uid: &str, counter: ProfileCounter, delta: i64) -> Result<i64> {
        self.mutate(uid, move |p| {
            let value = p.counter_mut(counter);
            *value += delta;
            *value
        })
        .await
    }
}
