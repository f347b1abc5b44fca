use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::difficulty::DifficultyBand;
use crate::model::ids::{CategoryId, CompositeKey, UserId};
use crate::time::CalendarDay;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("level must be at least 1, got {0}")]
    InvalidLevel(u32),

    #[error("at least one category must stay enabled")]
    LastCategory,

    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
}

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

/// Achievements a learner can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstPhrase,
    FiftyPhrases,
    HundredPhrases,
    FirstDailyProgram,
    ThreeDayStreak,
    SevenDayStreak,
    LevelFive,
    LevelTen,
}

impl Badge {
    pub const ALL: [Badge; 8] = [
        Badge::FirstPhrase,
        Badge::FiftyPhrases,
        Badge::HundredPhrases,
        Badge::FirstDailyProgram,
        Badge::ThreeDayStreak,
        Badge::SevenDayStreak,
        Badge::LevelFive,
        Badge::LevelTen,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Badge::FirstPhrase => "Eerste zin",
            Badge::FiftyPhrases => "50 zinnen",
            Badge::HundredPhrases => "100 zinnen",
            Badge::FirstDailyProgram => "Eerste dagprogramma",
            Badge::ThreeDayStreak => "3 dagen op rij",
            Badge::SevenDayStreak => "7 dagen op rij",
            Badge::LevelFive => "Niveau 5",
            Badge::LevelTen => "Niveau 10",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Raw profile fields as read from the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileDraft {
    pub user_id: UserId,
    pub level: u32,
    pub total_points: u64,
    #[serde(default)]
    pub completed_phrases: BTreeSet<CompositeKey>,
    #[serde(default)]
    pub completed_days: BTreeSet<CalendarDay>,
    #[serde(default)]
    pub enabled_categories: Option<Vec<CategoryId>>,
    #[serde(default)]
    pub difficulty_preference: Option<DifficultyBand>,
    #[serde(default)]
    pub badges: BTreeSet<Badge>,
}

/// Account-level learner state consumed by the daily program.
///
/// Lifetime sets (`completed_phrases`, `completed_days`) only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    user_id: UserId,
    level: u32,
    total_points: u64,
    completed_phrases: BTreeSet<CompositeKey>,
    completed_days: BTreeSet<CalendarDay>,
    enabled_categories: Option<Vec<CategoryId>>,
    difficulty_preference: Option<DifficultyBand>,
    badges: BTreeSet<Badge>,
}

impl UserProfile {
    /// Fresh profile for a new account: level 1, no points.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            level: 1,
            total_points: 0,
            completed_phrases: BTreeSet::new(),
            completed_days: BTreeSet::new(),
            enabled_categories: None,
            difficulty_preference: None,
            badges: BTreeSet::new(),
        }
    }

    /// Rehydrate a profile from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidLevel` if the stored level is zero.
    pub fn from_persisted(draft: UserProfileDraft) -> Result<Self, ProfileError> {
        if draft.level == 0 {
            return Err(ProfileError::InvalidLevel(draft.level));
        }
        Ok(Self {
            user_id: draft.user_id,
            level: draft.level,
            total_points: draft.total_points,
            completed_phrases: draft.completed_phrases,
            completed_days: draft.completed_days,
            enabled_categories: draft.enabled_categories,
            difficulty_preference: draft.difficulty_preference,
            badges: draft.badges,
        })
    }

    #[must_use]
    pub fn to_draft(&self) -> UserProfileDraft {
        UserProfileDraft {
            user_id: self.user_id,
            level: self.level,
            total_points: self.total_points,
            completed_phrases: self.completed_phrases.clone(),
            completed_days: self.completed_days.clone(),
            enabled_categories: self.enabled_categories.clone(),
            difficulty_preference: self.difficulty_preference,
            badges: self.badges.clone(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    #[must_use]
    pub fn completed_phrases(&self) -> &BTreeSet<CompositeKey> {
        &self.completed_phrases
    }

    #[must_use]
    pub fn completed_days(&self) -> &BTreeSet<CalendarDay> {
        &self.completed_days
    }

    /// Enabled categories, or `None` when every category is enabled.
    #[must_use]
    pub fn enabled_categories(&self) -> Option<&[CategoryId]> {
        self.enabled_categories.as_deref()
    }

    #[must_use]
    pub fn difficulty_preference(&self) -> Option<DifficultyBand> {
        self.difficulty_preference
    }

    #[must_use]
    pub fn badges(&self) -> &BTreeSet<Badge> {
        &self.badges
    }

    /// Adds points and sets the level. Returns the previous level.
    pub fn add_points(&mut self, points: u64, level: u32) -> u32 {
        let previous = self.level;
        self.total_points = self.total_points.saturating_add(points);
        self.level = level.max(1);
        previous
    }

    /// Returns true if the phrase was not completed before.
    pub fn record_completed_phrase(&mut self, key: CompositeKey) -> bool {
        self.completed_phrases.insert(key)
    }

    /// Returns true if the day was not recorded before.
    pub fn record_completed_day(&mut self, day: CalendarDay) -> bool {
        self.completed_days.insert(day)
    }

    /// Returns true if the badge is new.
    pub fn award_badge(&mut self, badge: Badge) -> bool {
        self.badges.insert(badge)
    }

    pub fn set_difficulty_preference(&mut self, preference: Option<DifficultyBand>) {
        self.difficulty_preference = preference;
    }

    /// Flips a category on or off.
    ///
    /// `all` lists every category of the catalog; it seeds the enabled list
    /// when the profile still has every category enabled implicitly.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::UnknownCategory` for ids missing from `all`, and
    /// `ProfileError::LastCategory` when the toggle would disable everything.
    pub fn toggle_category(
        &mut self,
        category: &CategoryId,
        all: &[CategoryId],
    ) -> Result<bool, ProfileError> {
        if !all.contains(category) {
            return Err(ProfileError::UnknownCategory(category.clone()));
        }
        let mut enabled = self
            .enabled_categories
            .clone()
            .unwrap_or_else(|| all.to_vec());

        let now_enabled = if let Some(pos) = enabled.iter().position(|c| c == category) {
            if enabled.len() == 1 {
                return Err(ProfileError::LastCategory);
            }
            enabled.remove(pos);
            false
        } else {
            enabled.push(category.clone());
            true
        };

        self.enabled_categories = Some(enabled);
        Ok(now_enabled)
    }

    #[must_use]
    pub fn is_category_enabled(&self, category: &CategoryId) -> bool {
        self.enabled_categories
            .as_ref()
            .is_none_or(|enabled| enabled.contains(category))
    }
}
