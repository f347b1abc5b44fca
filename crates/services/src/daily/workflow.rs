use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use storage::repository::ProfileRepository;
use svenska_core::answer;
use svenska_core::model::{
    Badge, Catalog, CategoryId, DifficultyBand, ExerciseItem, UserId, UserProfile,
};
use svenska_core::rewards::{PracticeMode, RewardOutcome, award_badges, reward_correct_answer};
use svenska_core::CalendarDay;

use super::cache::{CachedDay, DailyCache, StaleReason};
use super::plan::{DailyProgram, DailyProgramBuilder};
use super::progress::{DailyCompletionSet, DailyProgress};
use super::session::{AnswerOutcome, DailySession, SessionStatus};
use crate::Clock;
use crate::config::DailyConfig;
use crate::error::DailyServiceError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where today's program came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSource {
    /// Reused from the local store.
    Cached,
    /// Built because the cache could not be reused.
    Generated(StaleReason),
    /// Built because the learner changed their preferences.
    PreferencesChanged,
}

/// One-shot notice that today's program is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCompleteSignal {
    pub day: CalendarDay,
    pub shown_at: DateTime<Utc>,
    pub dismiss_after: Duration,
    /// Badges earned by finishing the day.
    pub new_badges: Vec<Badge>,
}

impl DailyCompleteSignal {
    #[must_use]
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.shown_at)
            .to_std()
            .map_or(true, |elapsed| elapsed < self.dismiss_after)
    }
}

/// Everything the front end holds for the current day.
///
/// Owned by the caller and passed to `DailyLoopService` by `&mut`.
#[derive(Debug, Clone)]
pub struct DailyState {
    day: CalendarDay,
    profile: UserProfile,
    session: DailySession,
    source: ProgramSource,
    signal: Option<DailyCompleteSignal>,
}

impl DailyState {
    #[must_use]
    pub fn day(&self) -> CalendarDay {
        self.day
    }

    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    #[must_use]
    pub fn session(&self) -> &DailySession {
        &self.session
    }

    #[must_use]
    pub fn program(&self) -> &DailyProgram {
        self.session.program()
    }

    #[must_use]
    pub fn completion(&self) -> &DailyCompletionSet {
        self.session.completion()
    }

    #[must_use]
    pub fn progress(&self) -> DailyProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&ExerciseItem> {
        self.session.current_item()
    }

    #[must_use]
    pub fn source(&self) -> ProgramSource {
        self.source
    }

    #[must_use]
    pub fn signal(&self) -> Option<&DailyCompleteSignal> {
        self.signal.as_ref()
    }

    pub fn dismiss_signal(&mut self) {
        self.signal = None;
    }

    /// Leave the program screen; progress is kept.
    pub fn leave(&mut self) {
        self.session.leave();
    }

    fn replace_program(
        &mut self,
        day: CalendarDay,
        program: DailyProgram,
        completion: DailyCompletionSet,
        source: ProgramSource,
    ) {
        self.day = day;
        self.session = DailySession::new(program, completion);
        self.source = source;
        self.signal = None;
    }
}

/// Result of answering the presented item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAnswerResult {
    pub outcome: AnswerOutcome,
    /// Set only for the first correct answer of an item today.
    pub reward: Option<RewardOutcome>,
    pub progress: DailyProgress,
    pub signal: Option<DailyCompleteSignal>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates the daily program: caching, answering, rewards and rollover.
#[derive(Clone)]
pub struct DailyLoopService {
    clock: Clock,
    catalog: Arc<Catalog>,
    cache: DailyCache,
    profiles: Arc<dyn ProfileRepository>,
    config: DailyConfig,
    seed: Option<u64>,
}

impl DailyLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<Catalog>,
        cache: DailyCache,
        profiles: Arc<dyn ProfileRepository>,
        config: DailyConfig,
    ) -> Self {
        Self {
            clock,
            catalog,
            cache,
            profiles,
            config,
            seed: None,
        }
    }

    /// Shuffle with a fixed seed instead of thread entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load the learner and today's program, and present the first open item.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Storage` if the profile cannot be loaded or created.
    pub async fn open(&self, user_id: UserId) -> Result<DailyState, DailyServiceError> {
        let profile = match self.profiles.get_profile(user_id).await? {
            Some(profile) => profile,
            None => {
                let profile = UserProfile::new(user_id);
                self.profiles.save_profile(&profile).await?;
                tracing::info!(user_id = %user_id, "created learner profile");
                profile
            }
        };

        let today = self.clock.today();
        let (program, completion, source) = self.generate_daily_program(&profile, today).await;
        let mut state = DailyState {
            day: today,
            profile,
            session: DailySession::new(program, completion),
            source,
            signal: None,
        };
        self.settle(&mut state).await?;
        Ok(state)
    }

    /// Reuse today's cached program, or build and persist a new one.
    ///
    /// A fresh program always starts with an empty completion set.
    pub async fn generate_daily_program(
        &self,
        profile: &UserProfile,
        today: CalendarDay,
    ) -> (DailyProgram, DailyCompletionSet, ProgramSource) {
        match self.cache.load(profile.user_id(), today).await {
            CachedDay::Fresh {
                program,
                completion,
            } => {
                tracing::debug!(day = %today, items = program.len(), "reusing cached daily program");
                (program, completion, ProgramSource::Cached)
            }
            CachedDay::Stale(reason) => {
                let program = self.build_program(profile);
                tracing::info!(
                    day = %today,
                    items = program.len(),
                    reason = ?reason,
                    "generated daily program"
                );
                self.cache
                    .store_program(profile.user_id(), today, &program)
                    .await;
                (program, DailyCompletionSet::new(), ProgramSource::Generated(reason))
            }
        }
    }

    /// Re-enter the program, rolling over to a new day when the date changed.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Storage` if finishing the day cannot be saved.
    pub async fn resume(&self, state: &mut DailyState) -> Result<SessionStatus, DailyServiceError> {
        if !self.roll_over(state).await? {
            self.settle(state).await?;
        }
        Ok(state.session.status())
    }

    /// Switch to today's program if `state` belongs to an earlier day.
    ///
    /// Leaves the presented item alone when the day has not changed. Returns
    /// true when the program was replaced.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Storage` if finishing the new day cannot be saved.
    pub async fn roll_over(&self, state: &mut DailyState) -> Result<bool, DailyServiceError> {
        let today = self.clock.today();
        if today == state.day {
            return Ok(false);
        }
        tracing::info!(from = %state.day, to = %today, "day rolled over");
        let (program, completion, source) = self.generate_daily_program(&state.profile, today).await;
        state.replace_program(today, program, completion, source);
        self.settle(state).await?;
        Ok(true)
    }

    /// Present a specific item of today's program.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Session` for an invalid index or a finished day.
    pub fn present(&self, state: &mut DailyState, index: usize) -> Result<(), DailyServiceError> {
        state.session.present(index)?;
        Ok(())
    }

    /// Check a typed answer against the presented item.
    ///
    /// # Errors
    ///
    /// See [`DailyLoopService::answer_graded`].
    pub async fn answer(
        &self,
        state: &mut DailyState,
        given: &str,
    ) -> Result<DailyAnswerResult, DailyServiceError> {
        let correct = state
            .session
            .current_item()
            .is_some_and(|item| answer::is_correct(given, &item.accepted_answers()));
        self.answer_graded(state, correct).await
    }

    /// Record an already graded answer for the presented item.
    ///
    /// The completion set is persisted best effort. The profile is saved last;
    /// when that fails the in-memory state is already updated and
    /// [`DailyLoopService::sync_profile`] can retry.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Session` when nothing is presented and
    /// `DailyServiceError::Storage` when the profile cannot be saved.
    pub async fn answer_graded(
        &self,
        state: &mut DailyState,
        correct: bool,
    ) -> Result<DailyAnswerResult, DailyServiceError> {
        let item = state.session.current_item().cloned();
        let outcome = state.session.answer(correct)?;

        let newly_answered = match &outcome {
            AnswerOutcome::Advanced { answered, .. } | AnswerOutcome::DayComplete { answered }
                if answered.newly_completed =>
            {
                Some(answered)
            }
            _ => None,
        };

        let mut reward = None;
        if let (Some(answered), Some(item)) = (newly_answered, item.as_ref()) {
            self.cache
                .store_completion(state.profile.user_id(), state.session.completion())
                .await;
            let phrase_key = (!item.is_grammar()).then(|| answered.key.clone());
            reward = Some(reward_correct_answer(
                &mut state.profile,
                PracticeMode::from(item.exercise_type()),
                phrase_key,
                state.day,
            ));
        }

        let signal = if matches!(outcome, AnswerOutcome::DayComplete { .. }) {
            self.complete_day(state)
        } else {
            None
        };

        if reward.is_some() || signal.is_some() {
            self.profiles.save_profile(&state.profile).await?;
        }

        Ok(DailyAnswerResult {
            outcome,
            reward,
            progress: state.session.progress(),
            signal,
        })
    }

    /// Move past the presented item. Returns the newly presented index.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Session` when nothing is presented.
    pub fn skip(&self, state: &mut DailyState) -> Result<usize, DailyServiceError> {
        Ok(state.session.skip()?)
    }

    /// Change the phrase difficulty preference and rebuild today's program.
    ///
    /// Returns false when the preference did not change.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Storage` if the profile cannot be saved.
    pub async fn change_difficulty_preference(
        &self,
        state: &mut DailyState,
        preference: Option<DifficultyBand>,
    ) -> Result<bool, DailyServiceError> {
        if state.profile.difficulty_preference() == preference {
            return Ok(false);
        }
        state.profile.set_difficulty_preference(preference);
        tracing::info!(preference = ?preference, "difficulty preference changed");
        self.regenerate(state).await;
        self.profiles.save_profile(&state.profile).await?;
        Ok(true)
    }

    /// Enable or disable a category and rebuild today's program.
    ///
    /// Returns whether the category is now enabled.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Profile` for unknown categories or when the
    /// last enabled category would be disabled, and
    /// `DailyServiceError::Storage` if the profile cannot be saved.
    pub async fn toggle_category(
        &self,
        state: &mut DailyState,
        category: &CategoryId,
    ) -> Result<bool, DailyServiceError> {
        let enabled = state
            .profile
            .toggle_category(category, &self.catalog.category_ids())?;
        tracing::info!(category = %category, enabled, "category toggled");
        self.regenerate(state).await;
        self.profiles.save_profile(&state.profile).await?;
        Ok(enabled)
    }

    /// Drop today's cached program and start over with a fresh one.
    pub async fn reset_today(&self, state: &mut DailyState) {
        self.cache.clear(state.profile.user_id()).await;
        let today = self.clock.today();
        let (program, completion, source) =
            self.generate_daily_program(&state.profile, today).await;
        state.replace_program(today, program, completion, source);
        state.session.resume();
    }

    /// Retry saving the profile after an account-store failure.
    ///
    /// # Errors
    ///
    /// Returns `DailyServiceError::Storage` if the profile still cannot be saved.
    pub async fn sync_profile(&self, state: &DailyState) -> Result<(), DailyServiceError> {
        self.profiles.save_profile(&state.profile).await?;
        Ok(())
    }

    /// The completion signal, hidden once its dismiss delay has passed.
    pub fn poll_signal<'a>(&self, state: &'a mut DailyState) -> Option<&'a DailyCompleteSignal> {
        let now = self.clock.now();
        if state.signal.as_ref().is_some_and(|signal| !signal.is_visible_at(now)) {
            state.signal = None;
        }
        state.signal.as_ref()
    }

    fn build_program(&self, profile: &UserProfile) -> DailyProgram {
        let builder = DailyProgramBuilder::new(&self.catalog)
            .with_categories(profile.enabled_categories())
            .with_difficulty_preference(profile.difficulty_preference())
            .with_level(profile.level());
        match self.seed {
            Some(seed) => builder.build(&mut StdRng::seed_from_u64(seed)),
            None => builder.build(&mut rand::rng()),
        }
    }

    async fn regenerate(&self, state: &mut DailyState) {
        let today = self.clock.today();
        let program = self.build_program(&state.profile);
        tracing::info!(day = %today, items = program.len(), "rebuilt daily program");
        self.cache
            .store_program(state.profile.user_id(), today, &program)
            .await;
        state.replace_program(
            today,
            program,
            DailyCompletionSet::new(),
            ProgramSource::PreferencesChanged,
        );
        state.session.resume();
    }

    /// Present the next open item; finish the day when there is none.
    async fn settle(&self, state: &mut DailyState) -> Result<(), DailyServiceError> {
        if state.session.resume() == SessionStatus::DayComplete && self.complete_day(state).is_some()
        {
            self.profiles.save_profile(&state.profile).await?;
        }
        Ok(())
    }

    /// Record the finished day once and raise the signal.
    ///
    /// An empty program never counts as a finished day.
    fn complete_day(&self, state: &mut DailyState) -> Option<DailyCompleteSignal> {
        if state.session.program().is_empty() || !state.profile.record_completed_day(state.day) {
            return None;
        }
        let new_badges = award_badges(&mut state.profile, state.day);
        tracing::info!(
            day = %state.day,
            items = state.session.program().len(),
            badges = new_badges.len(),
            "daily program complete"
        );
        let signal = DailyCompleteSignal {
            day: state.day,
            shown_at: self.clock.now(),
            dismiss_after: self.config.complete_signal_duration,
            new_badges,
        };
        state.signal = Some(signal.clone());
        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signal_at(shown_at: DateTime<Utc>) -> DailyCompleteSignal {
        DailyCompleteSignal {
            day: CalendarDay::from_date(shown_at.date_naive()),
            shown_at,
            dismiss_after: Duration::from_secs(3),
            new_badges: Vec::new(),
        }
    }

    #[test]
    fn signal_hides_after_delay() {
        let shown = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let signal = signal_at(shown);
        assert!(signal.is_visible_at(shown));
        assert!(signal.is_visible_at(shown + chrono::Duration::seconds(2)));
        assert!(!signal.is_visible_at(shown + chrono::Duration::seconds(3)));
    }

    #[test]
    fn signal_is_visible_if_clock_went_backwards() {
        let shown = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(signal_at(shown).is_visible_at(shown - chrono::Duration::seconds(5)));
    }
}
