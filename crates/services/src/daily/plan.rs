use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use svenska_core::model::{
    Catalog, CategoryId, CompositeKey, DifficultyBand, ExerciseItem, ExerciseType,
    GrammarExercise, PhraseExercise, filter_by_difficulty,
};

/// Phrase items in a full daily program.
pub const PHRASES_PER_DAY: usize = 8;

/// Grammar items in a full daily program.
pub const GRAMMAR_PER_DAY: usize = 2;

/// Upper bound on the length of a daily program.
pub const MAX_DAILY_ITEMS: usize = PHRASES_PER_DAY + GRAMMAR_PER_DAY;

//
// ─── PROGRAM ───────────────────────────────────────────────────────────────────
//

/// The ordered exercise set assigned for one calendar day.
///
/// Replaced wholesale on regeneration, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyProgram {
    items: Vec<ExerciseItem>,
}

impl DailyProgram {
    #[must_use]
    pub fn new(items: Vec<ExerciseItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[ExerciseItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExerciseItem> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Composite keys in program order.
    pub fn keys(&self) -> impl Iterator<Item = CompositeKey> + '_ {
        self.items.iter().map(ExerciseItem::composite_key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &CompositeKey) -> bool {
        self.keys().any(|k| &k == key)
    }

    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<CompositeKey> {
        self.items.get(index).map(ExerciseItem::composite_key)
    }

    /// Phrase items, in program order.
    pub fn phrase_items(&self) -> impl Iterator<Item = &PhraseExercise> {
        self.items.iter().filter_map(ExerciseItem::as_phrase)
    }

    #[must_use]
    pub fn grammar_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_grammar()).count()
    }
}

//
// ─── BUILDER ───────────────────────────────────────────────────────────────────
//

/// Assembles a fresh daily program from the catalog.
///
/// Phrases follow the learner's difficulty preference; grammar follows the
/// band derived from their level. The two filters are independent.
pub struct DailyProgramBuilder<'a> {
    catalog: &'a Catalog,
    enabled_categories: Option<&'a [CategoryId]>,
    difficulty_preference: Option<DifficultyBand>,
    level: u32,
}

impl<'a> DailyProgramBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            enabled_categories: None,
            difficulty_preference: None,
            level: 1,
        }
    }

    /// Restrict phrases to these categories. `None` or an empty list means all.
    #[must_use]
    pub fn with_categories(mut self, enabled: Option<&'a [CategoryId]>) -> Self {
        self.enabled_categories = enabled.filter(|ids| !ids.is_empty());
        self
    }

    #[must_use]
    pub fn with_difficulty_preference(mut self, preference: Option<DifficultyBand>) -> Self {
        self.difficulty_preference = preference;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Phrases eligible today, tagged with their category, in catalog order.
    ///
    /// Duplicate composite keys are dropped so the program keys stay unique.
    #[must_use]
    pub fn phrase_pool(&self) -> Vec<PhraseExercise> {
        let mut seen = HashSet::new();
        let tagged: Vec<PhraseExercise> = self
            .catalog
            .categories()
            .iter()
            .filter(|category| {
                self.enabled_categories
                    .is_none_or(|enabled| enabled.contains(&category.id))
            })
            .flat_map(|category| {
                category.phrases.iter().map(move |phrase| {
                    PhraseExercise::from_phrase(category, phrase, ExerciseType::Practice)
                })
            })
            .filter(|exercise| seen.insert(exercise.composite_key()))
            .collect();
        filter_by_difficulty(tagged, self.difficulty_preference)
    }

    /// Grammar exercises admitted by the level band.
    #[must_use]
    pub fn grammar_pool(&self) -> Vec<GrammarExercise> {
        self.catalog.grammar_for_level(self.level)
    }

    /// Shuffle both pools and lay out today's program.
    ///
    /// Layout: four phrases, grammar, four phrases, grammar. Short pools give
    /// a shorter program; empty grammar slots are dropped.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> DailyProgram {
        let mut phrases = self.phrase_pool();
        let phrase_pool_len = phrases.len();
        phrases.shuffle(rng);
        phrases.truncate(PHRASES_PER_DAY);
        for (index, phrase) in phrases.iter_mut().enumerate() {
            phrase.exercise_type = ExerciseType::for_phrase_position(index);
        }

        let mut grammar = self.grammar_pool();
        let grammar_pool_len = grammar.len();
        grammar.shuffle(rng);
        grammar.truncate(GRAMMAR_PER_DAY);

        if phrase_pool_len < PHRASES_PER_DAY || grammar_pool_len < GRAMMAR_PER_DAY {
            tracing::info!(
                phrase_pool = phrase_pool_len,
                grammar_pool = grammar_pool_len,
                "eligible pool is short; daily program will be shorter"
            );
        }

        let half = PHRASES_PER_DAY / 2;
        let mut phrases = phrases.into_iter().map(ExerciseItem::Phrase);
        let mut grammar = grammar.into_iter().map(ExerciseItem::Grammar);

        let mut items = Vec::with_capacity(MAX_DAILY_ITEMS);
        items.extend(phrases.by_ref().take(half));
        items.extend(grammar.next());
        items.extend(phrases);
        items.extend(grammar.next());

        DailyProgram::new(items)
    }
}
