use std::sync::Arc;

use storage::repository::ProfileRepository;
use svenska_core::model::{Badge, Catalog, UserId, UserProfile};
use svenska_core::rewards::{CategoryProgress, category_progress, current_streak};

use crate::error::ProfileServiceError;
use crate::Clock;

/// Read-only summary of a learner for the stats screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOverview {
    pub user_id: UserId,
    pub level: u32,
    pub total_points: u64,
    /// Points still needed for the next level.
    pub points_to_next_level: u64,
    pub streak: u32,
    pub completed_phrases: usize,
    pub completed_days: usize,
    pub badges: Vec<Badge>,
    pub categories: Vec<CategoryProgress>,
}

/// Loads and summarizes learner profiles.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    catalog: Arc<Catalog>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<Catalog>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            clock,
            catalog,
            profiles,
        }
    }

    /// Fetch a profile, creating a fresh one on first use.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the account store fails.
    pub async fn load_or_create(&self, user_id: UserId) -> Result<UserProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.get_profile(user_id).await? {
            return Ok(profile);
        }
        let profile = UserProfile::new(user_id);
        self.profiles.save_profile(&profile).await?;
        tracing::info!(user_id = %user_id, "created learner profile");
        Ok(profile)
    }

    /// Persist a profile changed outside the daily loop.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the account store fails.
    pub async fn save(&self, profile: &UserProfile) -> Result<(), ProfileServiceError> {
        self.profiles.save_profile(profile).await?;
        Ok(())
    }

    #[must_use]
    pub fn overview(&self, profile: &UserProfile) -> ProfileOverview {
        let today = self.clock.today();
        let next_level_at = u64::from(profile.level()) * 100;
        ProfileOverview {
            user_id: profile.user_id(),
            level: profile.level(),
            total_points: profile.total_points(),
            points_to_next_level: next_level_at.saturating_sub(profile.total_points()),
            streak: current_streak(profile.completed_days(), today),
            completed_phrases: profile.completed_phrases().len(),
            completed_days: profile.completed_days().len(),
            badges: profile.badges().iter().copied().collect(),
            categories: category_progress(&self.catalog, profile.completed_phrases()),
        }
    }
}
