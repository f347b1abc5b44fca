mod catalog;
mod difficulty;
mod exercise;
mod ids;
mod profile;

pub use catalog::{Catalog, CatalogError, Category, GrammarBank, GrammarEntry, GrammarType, Phrase};
pub use difficulty::{
    Difficulty, DifficultyBand, DifficultyError, Graded, band_for_level, filter_by_difficulty,
};
pub use exercise::{ExerciseItem, ExerciseType, GrammarExercise, PhraseExercise};
pub use ids::{
    CategoryId, CompositeKey, GRAMMAR_CATEGORY_ID, GRAMMAR_CATEGORY_NAME, GrammarId, ParseIdError,
    PhraseId, UserId,
};
pub use profile::{Badge, ProfileError, UserProfile, UserProfileDraft};
