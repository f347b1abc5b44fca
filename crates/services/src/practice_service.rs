use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use storage::repository::ProfileRepository;
use svenska_core::answer;
use svenska_core::model::{
    Catalog, CategoryId, ExerciseType, GrammarExercise, PhraseExercise, UserProfile,
    filter_by_difficulty,
};
use svenska_core::rewards::{PracticeMode, RewardOutcome, reward_correct_answer};

use crate::error::PracticeError;
use crate::Clock;

/// Free practice outside the daily program: practice, writing, flashcards, grammar.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    catalog: Arc<Catalog>,
    profiles: Arc<dyn ProfileRepository>,
}

impl PracticeService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<Catalog>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            clock,
            catalog,
            profiles,
        }
    }

    /// Phrases for a practice round, filtered by the learner's preference.
    ///
    /// With no `category` every enabled category contributes.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::UnknownCategory` for ids missing from the
    /// catalog and `PracticeError::Empty` when nothing is left after filtering.
    pub fn phrase_pool(
        &self,
        profile: &UserProfile,
        category: Option<&CategoryId>,
        mode: PracticeMode,
    ) -> Result<Vec<PhraseExercise>, PracticeError> {
        let exercise_type = match mode {
            PracticeMode::Writing => ExerciseType::Writing,
            PracticeMode::Practice | PracticeMode::Flashcard | PracticeMode::Grammar => {
                ExerciseType::Practice
            }
        };

        let categories = match category {
            Some(id) => vec![
                self.catalog
                    .category(id)
                    .ok_or_else(|| PracticeError::UnknownCategory(id.clone()))?,
            ],
            None => self
                .catalog
                .categories()
                .iter()
                .filter(|c| profile.is_category_enabled(&c.id))
                .collect(),
        };

        let tagged: Vec<PhraseExercise> = categories
            .into_iter()
            .flat_map(|category| {
                category
                    .phrases
                    .iter()
                    .map(move |phrase| PhraseExercise::from_phrase(category, phrase, exercise_type))
            })
            .collect();
        let pool = filter_by_difficulty(tagged, profile.difficulty_preference());
        if pool.is_empty() {
            return Err(PracticeError::Empty);
        }
        Ok(pool)
    }

    /// Grammar drills admitted by the learner's level.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Empty` when the bank has nothing for this level.
    pub fn grammar_pool(&self, profile: &UserProfile) -> Result<Vec<GrammarExercise>, PracticeError> {
        let pool = self.catalog.grammar_for_level(profile.level());
        if pool.is_empty() {
            return Err(PracticeError::Empty);
        }
        Ok(pool)
    }

    /// Shuffle a pool in place before a round.
    pub fn shuffle<T, R: Rng + ?Sized>(pool: &mut [T], rng: &mut R) {
        pool.shuffle(rng);
    }

    #[must_use]
    pub fn check_phrase(phrase: &PhraseExercise, given: &str) -> bool {
        answer::is_correct(given, &[phrase.swedish.as_str()])
    }

    #[must_use]
    pub fn check_grammar(exercise: &GrammarExercise, given: &str) -> bool {
        let accepted: Vec<&str> = std::iter::once(exercise.answer.as_str())
            .chain(exercise.alternatives.iter().map(String::as_str))
            .collect();
        answer::is_correct(given, &accepted)
    }

    /// Reward a correct phrase answer and persist the profile.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the profile cannot be saved.
    pub async fn record_phrase(
        &self,
        profile: &mut UserProfile,
        phrase: &PhraseExercise,
        mode: PracticeMode,
    ) -> Result<RewardOutcome, PracticeError> {
        let outcome = reward_correct_answer(
            profile,
            mode,
            Some(phrase.composite_key()),
            self.clock.today(),
        );
        self.profiles.save_profile(profile).await?;
        Ok(outcome)
    }

    /// Reward a correct grammar answer and persist the profile.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the profile cannot be saved.
    pub async fn record_grammar(&self, profile: &mut UserProfile) -> Result<RewardOutcome, PracticeError> {
        let outcome =
            reward_correct_answer(profile, PracticeMode::Grammar, None, self.clock.today());
        self.profiles.save_profile(profile).await?;
        Ok(outcome)
    }
}
