use async_trait::async_trait;
use chrono::Utc;
use svenska_core::model::{UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::{map_profile_row, to_json, u64_to_i64};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id,
                level,
                total_points,
                difficulty_preference,
                enabled_categories,
                completed_phrases,
                completed_days,
                badges
            FROM user_profiles
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let enabled_categories = profile
            .enabled_categories()
            .map(|ids| to_json(&ids))
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO user_profiles (
                id,
                level,
                total_points,
                difficulty_preference,
                enabled_categories,
                completed_phrases,
                completed_days,
                badges,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                level = excluded.level,
                total_points = excluded.total_points,
                difficulty_preference = excluded.difficulty_preference,
                enabled_categories = excluded.enabled_categories,
                completed_phrases = excluded.completed_phrases,
                completed_days = excluded.completed_days,
                badges = excluded.badges,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.user_id().to_string())
        .bind(i64::from(profile.level()))
        .bind(u64_to_i64("total_points", profile.total_points())?)
        .bind(profile.difficulty_preference().map(|band| band.as_str()))
        .bind(enabled_categories)
        .bind(to_json(profile.completed_phrases())?)
        .bind(to_json(profile.completed_days())?)
        .bind(to_json(profile.badges())?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
