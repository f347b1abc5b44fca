use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use svenska_core::model::{DifficultyBand, UserId, UserProfile, UserProfileDraft};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn user_id_from_str(raw: &str) -> Result<UserId, StorageError> {
    raw.parse::<UserId>().map_err(ser)
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;

    let level_i64: i64 = row.try_get("level").map_err(ser)?;
    let level = u32::try_from(level_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid level: {level_i64}")))?;

    let points_i64: i64 = row.try_get("total_points").map_err(ser)?;
    let total_points = u64::try_from(points_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid total_points: {points_i64}")))?;

    let difficulty_preference = row
        .try_get::<Option<String>, _>("difficulty_preference")
        .map_err(ser)?
        .map(|raw| raw.parse::<DifficultyBand>().map_err(ser))
        .transpose()?;

    let enabled_categories = row
        .try_get::<Option<String>, _>("enabled_categories")
        .map_err(ser)?
        .map(|raw| from_json("enabled_categories", &raw))
        .transpose()?;

    let completed_phrases: String = row.try_get("completed_phrases").map_err(ser)?;
    let completed_days: String = row.try_get("completed_days").map_err(ser)?;
    let badges: String = row.try_get("badges").map_err(ser)?;

    UserProfile::from_persisted(UserProfileDraft {
        user_id: user_id_from_str(&id)?,
        level,
        total_points,
        completed_phrases: from_json("completed_phrases", &completed_phrases)?,
        completed_days: from_json("completed_days", &completed_days)?,
        enabled_categories,
        difficulty_preference,
        badges: from_json("badges", &badges)?,
    })
    .map_err(ser)
}
