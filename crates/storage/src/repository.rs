use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use svenska_core::model::{UserId, UserProfile};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable device-local string store (the browser's `localStorage` role).
///
/// Writes to different keys are independent; callers must tolerate a partial
/// update across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Account store holding learner profiles. Last write wins.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by user id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError>;

    /// Persist or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(profile.user_id(), profile.clone());
        Ok(())
    }
}

/// Aggregates the local store and the account store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub local: Arc<dyn KeyValueStore>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let local: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo);
        Self { local, profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svenska_core::model::{Badge, DifficultyBand};

    #[tokio::test]
    async fn key_value_set_get_remove() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get("dailyProgramDate").await.unwrap(), None);

        repo.set("dailyProgramDate", "2024-01-01").await.unwrap();
        repo.set("dailyProgramDate", "2024-01-02").await.unwrap();
        assert_eq!(
            repo.get("dailyProgramDate").await.unwrap().as_deref(),
            Some("2024-01-02")
        );

        repo.remove("dailyProgramDate").await.unwrap();
        repo.remove("dailyProgramDate").await.unwrap();
        assert_eq!(repo.get("dailyProgramDate").await.unwrap(), None);
    }

    #[tokio::test]
    async fn round_trips_profile() {
        let repo = InMemoryRepository::new();
        let mut profile = UserProfile::new(UserId::generate());
        profile.set_difficulty_preference(Some(DifficultyBand::Hard));
        profile.award_badge(Badge::LevelFive);

        repo.save_profile(&profile).await.unwrap();

        let fetched = repo.get_profile(profile.user_id()).await.unwrap();
        assert_eq!(fetched, Some(profile));
        assert_eq!(repo.get_profile(UserId::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn storage_handles_share_state() {
        let storage = Storage::in_memory();
        storage.local.set("k", "v").await.unwrap();
        let profile = UserProfile::new(UserId::generate());
        storage.profiles.save_profile(&profile).await.unwrap();
        assert_eq!(storage.local.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(storage.profiles.get_profile(profile.user_id()).await.unwrap().is_some());
    }
}
