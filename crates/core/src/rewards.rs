//! Points, levels, streaks and badges.
//!
//! Everything here is a pure function of the profile and the current day, so
//! the services layer can apply rewards in memory before persisting them.

use std::collections::BTreeSet;

use crate::model::{
    Badge, Catalog, CategoryId, CompositeKey, ExerciseType, UserProfile,
};
use crate::time::CalendarDay;

/// Points needed to climb one level.
pub const POINTS_PER_LEVEL: u64 = 100;

//
// ─── PRACTICE MODES ────────────────────────────────────────────────────────────
//

/// Every way a learner can answer an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PracticeMode {
    Practice,
    Writing,
    Flashcard,
    Grammar,
}

impl PracticeMode {
    /// Points awarded for a correct answer in this mode.
    #[must_use]
    pub fn points(self) -> u64 {
        match self {
            PracticeMode::Practice => 10,
            PracticeMode::Writing => 15,
            PracticeMode::Flashcard => 5,
            PracticeMode::Grammar => 20,
        }
    }
}

impl From<ExerciseType> for PracticeMode {
    fn from(value: ExerciseType) -> Self {
        match value {
            ExerciseType::Practice => PracticeMode::Practice,
            ExerciseType::Writing => PracticeMode::Writing,
            ExerciseType::Grammar => PracticeMode::Grammar,
        }
    }
}

//
// ─── LEVELS & STREAKS ──────────────────────────────────────────────────────────
//

/// Level reached with `points` total points (level 1 at zero points).
#[must_use]
pub fn level_for_points(points: u64) -> u32 {
    let level = 1 + points / POINTS_PER_LEVEL;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Consecutive completed days ending today, or yesterday if today is still open.
#[must_use]
pub fn current_streak(completed_days: &BTreeSet<CalendarDay>, today: CalendarDay) -> u32 {
    let start = if completed_days.contains(&today) {
        Some(today)
    } else {
        today.previous().filter(|day| completed_days.contains(day))
    };

    let mut streak = 0_u32;
    let mut cursor = start;
    while let Some(day) = cursor {
        if !completed_days.contains(&day) {
            break;
        }
        streak = streak.saturating_add(1);
        cursor = day.previous();
    }
    streak
}

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

fn badge_earned(badge: Badge, profile: &UserProfile, streak: u32) -> bool {
    let phrases = profile.completed_phrases().len();
    match badge {
        Badge::FirstPhrase => phrases >= 1,
        Badge::FiftyPhrases => phrases >= 50,
        Badge::HundredPhrases => phrases >= 100,
        Badge::FirstDailyProgram => !profile.completed_days().is_empty(),
        Badge::ThreeDayStreak => streak >= 3,
        Badge::SevenDayStreak => streak >= 7,
        Badge::LevelFive => profile.level() >= 5,
        Badge::LevelTen => profile.level() >= 10,
    }
}

/// Awards every badge the profile now qualifies for; returns the new ones.
pub fn award_badges(profile: &mut UserProfile, today: CalendarDay) -> Vec<Badge> {
    let streak = current_streak(profile.completed_days(), today);
    let earned: Vec<Badge> = Badge::ALL
        .into_iter()
        .filter(|badge| !profile.badges().contains(badge))
        .filter(|badge| badge_earned(*badge, profile, streak))
        .collect();
    for badge in &earned {
        profile.award_badge(*badge);
    }
    earned
}

//
// ─── REWARDS ───────────────────────────────────────────────────────────────────
//

/// What a single correct answer changed on the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardOutcome {
    pub points_awarded: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub new_badges: Vec<Badge>,
}

impl RewardOutcome {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Applies the reward for a correct answer.
///
/// `phrase_key` is the composite key of a phrase item; it joins the lifetime
/// completed set. Grammar and free practice pass `None`.
pub fn reward_correct_answer(
    profile: &mut UserProfile,
    mode: PracticeMode,
    phrase_key: Option<CompositeKey>,
    today: CalendarDay,
) -> RewardOutcome {
    let points = mode.points();
    let level = level_for_points(profile.total_points().saturating_add(points));
    let level_before = profile.add_points(points, level);
    if let Some(key) = phrase_key {
        profile.record_completed_phrase(key);
    }
    let new_badges = award_badges(profile, today);
    RewardOutcome {
        points_awarded: points,
        level_before,
        level_after: profile.level(),
        new_badges,
    }
}

//
// ─── CATEGORY PROGRESS ─────────────────────────────────────────────────────────
//

/// Share of a category's phrases the learner ever completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category_id: CategoryId,
    pub name: String,
    pub completed: usize,
    pub total: usize,
}

impl CategoryProgress {
    /// Whole percent, 0 for an empty category.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.saturating_mul(100) / self.total;
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

#[must_use]
pub fn category_progress(
    catalog: &Catalog,
    completed: &BTreeSet<CompositeKey>,
) -> Vec<CategoryProgress> {
    catalog
        .categories()
        .iter()
        .map(|category| {
            let done = category
                .phrases
                .iter()
                .filter(|phrase| completed.contains(&CompositeKey::new(&category.id, phrase.id)))
                .count();
            CategoryProgress {
                category_id: category.id.clone(),
                name: category.name.clone(),
                completed: done,
                total: category.phrases.len(),
            }
        })
        .collect()
}
