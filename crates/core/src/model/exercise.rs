use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::catalog::{Category, GrammarEntry, GrammarType, Phrase};
use crate::model::difficulty::{Difficulty, Graded};
use crate::model::ids::{
    CategoryId, CompositeKey, GrammarId, PhraseId, GRAMMAR_CATEGORY_NAME,
};

/// How an item of the daily program is practiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    /// Listen and pronounce the Swedish phrase.
    Practice,
    /// Type the Swedish phrase from its Dutch translation.
    Writing,
    Grammar,
}

impl ExerciseType {
    /// Phrase items alternate practice/writing by position.
    #[must_use]
    pub fn for_phrase_position(index: usize) -> Self {
        if index % 2 == 0 {
            ExerciseType::Practice
        } else {
            ExerciseType::Writing
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::Practice => "practice",
            ExerciseType::Writing => "writing",
            ExerciseType::Grammar => "grammar",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PHRASE EXERCISE ───────────────────────────────────────────────────────────
//

/// A phrase tagged with its source category and assigned practice mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseExercise {
    pub id: PhraseId,
    pub swedish: String,
    pub dutch: String,
    pub pronunciation: String,
    pub difficulty: Difficulty,
    pub category_id: CategoryId,
    pub category_name: String,
    pub exercise_type: ExerciseType,
}

impl PhraseExercise {
    #[must_use]
    pub fn from_phrase(category: &Category, phrase: &Phrase, exercise_type: ExerciseType) -> Self {
        Self {
            id: phrase.id,
            swedish: phrase.swedish.clone(),
            dutch: phrase.dutch.clone(),
            pronunciation: phrase.pronunciation.clone(),
            difficulty: phrase.difficulty,
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            exercise_type,
        }
    }

    #[must_use]
    pub fn composite_key(&self) -> CompositeKey {
        CompositeKey::new(&self.category_id, self.id)
    }
}

impl Graded for PhraseExercise {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

//
// ─── GRAMMAR EXERCISE ──────────────────────────────────────────────────────────
//

/// A grammar drill placed in the daily program.
///
/// Always belongs to the `grammar` pseudo-category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarExercise {
    pub id: GrammarId,
    #[serde(rename = "type")]
    pub grammar_type: GrammarType,
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    pub difficulty: Difficulty,
}

impl GrammarExercise {
    #[must_use]
    pub fn from_entry(grammar_type: GrammarType, entry: &GrammarEntry) -> Self {
        Self {
            id: entry.id,
            grammar_type,
            prompt: entry.prompt.clone(),
            answer: entry.answer.clone(),
            alternatives: entry.alternatives.clone(),
            difficulty: entry.difficulty,
        }
    }

    #[must_use]
    pub fn composite_key(&self) -> CompositeKey {
        CompositeKey::new(&CategoryId::grammar(), self.id)
    }
}

impl Graded for GrammarExercise {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

//
// ─── EXERCISE ITEM ─────────────────────────────────────────────────────────────
//

/// One entry of a daily program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExerciseItem {
    Phrase(PhraseExercise),
    Grammar(GrammarExercise),
}

impl ExerciseItem {
    /// Key used to track completion of this item.
    #[must_use]
    pub fn composite_key(&self) -> CompositeKey {
        match self {
            ExerciseItem::Phrase(p) => p.composite_key(),
            ExerciseItem::Grammar(g) => g.composite_key(),
        }
    }

    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseItem::Phrase(p) => p.exercise_type,
            ExerciseItem::Grammar(_) => ExerciseType::Grammar,
        }
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        match self {
            ExerciseItem::Phrase(p) => p.category_id.clone(),
            ExerciseItem::Grammar(_) => CategoryId::grammar(),
        }
    }

    #[must_use]
    pub fn category_name(&self) -> &str {
        match self {
            ExerciseItem::Phrase(p) => &p.category_name,
            ExerciseItem::Grammar(_) => GRAMMAR_CATEGORY_NAME,
        }
    }

    /// Text shown to the learner for this item.
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            ExerciseItem::Phrase(p) if p.exercise_type == ExerciseType::Writing => &p.dutch,
            ExerciseItem::Phrase(p) => &p.swedish,
            ExerciseItem::Grammar(g) => &g.prompt,
        }
    }

    /// Answers that count as correct, primary answer first.
    #[must_use]
    pub fn accepted_answers(&self) -> Vec<&str> {
        match self {
            ExerciseItem::Phrase(p) => vec![p.swedish.as_str()],
            ExerciseItem::Grammar(g) => std::iter::once(g.answer.as_str())
                .chain(g.alternatives.iter().map(String::as_str))
                .collect(),
        }
    }

    #[must_use]
    pub fn as_phrase(&self) -> Option<&PhraseExercise> {
        match self {
            ExerciseItem::Phrase(p) => Some(p),
            ExerciseItem::Grammar(_) => None,
        }
    }

    #[must_use]
    pub fn is_grammar(&self) -> bool {
        matches!(self, ExerciseItem::Grammar(_))
    }
}

impl Graded for ExerciseItem {
    fn difficulty(&self) -> Difficulty {
        match self {
            ExerciseItem::Phrase(p) => p.difficulty,
            ExerciseItem::Grammar(g) => g.difficulty,
        }
    }
}
