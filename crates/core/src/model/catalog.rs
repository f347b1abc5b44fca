use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::model::difficulty::{Difficulty, Graded, band_for_level};
use crate::model::exercise::GrammarExercise;
use crate::model::ids::{CategoryId, GrammarId, PhraseId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate category id: {0}")]
    DuplicateCategory(CategoryId),

    #[error("category id {0} is reserved for grammar exercises")]
    ReservedCategory(CategoryId),
}

//
// ─── PHRASES ───────────────────────────────────────────────────────────────────
//

/// A Swedish phrase with its Dutch translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: PhraseId,
    pub swedish: String,
    pub dutch: String,
    #[serde(default)]
    pub pronunciation: String,
    pub difficulty: Difficulty,
}

impl Graded for Phrase {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Ordered list of phrases sharing a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub phrases: Vec<Phrase>,
}

//
// ─── GRAMMAR ───────────────────────────────────────────────────────────────────
//

/// Grammar topic an exercise drills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarType {
    /// en/ett articles.
    Articles,
    Plurals,
    VerbTenses,
    WordOrder,
    Adjectives,
    Pronouns,
}

impl GrammarType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GrammarType::Articles => "articles",
            GrammarType::Plurals => "plurals",
            GrammarType::VerbTenses => "verb_tenses",
            GrammarType::WordOrder => "word_order",
            GrammarType::Adjectives => "adjectives",
            GrammarType::Pronouns => "pronouns",
        }
    }
}

impl fmt::Display for GrammarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grammar exercise as stored in the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarEntry {
    pub id: GrammarId,
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    pub difficulty: Difficulty,
}

/// Grammar exercises partitioned by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrammarBank(BTreeMap<GrammarType, Vec<GrammarEntry>>);

impl GrammarBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: GrammarType, entry: GrammarEntry) {
        self.0.entry(kind).or_default().push(entry);
    }

    #[must_use]
    pub fn of_type(&self, kind: GrammarType) -> &[GrammarEntry] {
        self.0.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Every exercise in the bank, in type order.
    pub fn iter(&self) -> impl Iterator<Item = (GrammarType, &GrammarEntry)> {
        self.0
            .iter()
            .flat_map(|(kind, entries)| entries.iter().map(move |entry| (*kind, entry)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Static learning content: phrase categories plus the grammar bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    categories: Vec<Category>,
    #[serde(default)]
    grammar: GrammarBank,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate or reserved category ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when two categories share an id or a category
    /// uses the grammar slug.
    pub fn new(categories: Vec<Category>, grammar: GrammarBank) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if category.id.is_grammar() {
                return Err(CatalogError::ReservedCategory(category.id.clone()));
            }
            if !seen.insert(category.id.clone()) {
                return Err(CatalogError::DuplicateCategory(category.id.clone()));
            }
        }
        Ok(Self {
            categories,
            grammar,
        })
    }

    /// Parses and validates a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, or the validation
    /// errors of [`Catalog::new`].
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let parsed: Catalog = serde_json::from_str(raw)?;
        Self::new(parsed.categories, parsed.grammar)
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.id.clone()).collect()
    }

    #[must_use]
    pub fn grammar(&self) -> &GrammarBank {
        &self.grammar
    }

    /// Grammar exercises admitted by the band of `level`, in bank order.
    ///
    /// An entry repeating an earlier composite key is dropped.
    #[must_use]
    pub fn grammar_for_level(&self, level: u32) -> Vec<GrammarExercise> {
        let band = band_for_level(level);
        let mut seen = HashSet::new();
        self.grammar
            .iter()
            .filter(|(_, entry)| band.is_none_or(|band| band.admits_grammar(entry.difficulty)))
            .map(|(kind, entry)| GrammarExercise::from_entry(kind, entry))
            .filter(|exercise| seen.insert(exercise.composite_key()))
            .collect()
    }

    /// Total number of phrases across all categories.
    #[must_use]
    pub fn phrase_count(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }
}
