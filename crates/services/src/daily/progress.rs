use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use svenska_core::model::CompositeKey;

use super::plan::DailyProgram;
use crate::error::ProgressError;

/// Composite keys of the items completed today.
///
/// Stays a subset of the current program's keys; reset whenever the program
/// is regenerated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyCompletionSet(BTreeSet<CompositeKey>);

impl DailyCompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.0.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompositeKey> {
        self.0.iter()
    }

    /// Mark `key` complete. Returns true if it was not complete before.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotInProgram` if the key is not part of `program`.
    pub fn mark(&mut self, program: &DailyProgram, key: CompositeKey) -> Result<bool, ProgressError> {
        if !program.contains_key(&key) {
            return Err(ProgressError::NotInProgram(key));
        }
        Ok(self.0.insert(key))
    }

    /// Drop keys that do not belong to `program`. Returns how many were dropped.
    pub fn retain_program(&mut self, program: &DailyProgram) -> usize {
        let keys: BTreeSet<CompositeKey> = program.keys().collect();
        let before = self.0.len();
        self.0.retain(|key| keys.contains(key));
        before - self.0.len()
    }
}

/// Returns `completion` with `key` added; re-marking is a no-op.
///
/// # Errors
///
/// Returns `ProgressError::NotInProgram` if the key is not part of `program`.
pub fn mark_completed(
    program: &DailyProgram,
    completion: &DailyCompletionSet,
    key: CompositeKey,
) -> Result<DailyCompletionSet, ProgressError> {
    let mut next = completion.clone();
    next.mark(program, key)?;
    Ok(next)
}

/// True when every item of `program` is in `completion`. Vacuously true for an empty program.
#[must_use]
pub fn is_complete(program: &DailyProgram, completion: &DailyCompletionSet) -> bool {
    program.keys().all(|key| completion.contains(&key))
}

/// Aggregated view of today's progress, useful for the "N/Total" counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl DailyProgress {
    #[must_use]
    pub fn of(program: &DailyProgram, completion: &DailyCompletionSet) -> Self {
        let total = program.len();
        let completed = program.keys().filter(|key| completion.contains(key)).count();
        Self {
            total,
            completed,
            remaining: total - completed,
            is_complete: completed == total,
        }
    }

    /// Whole percent complete; an empty program counts as 100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        u8::try_from(self.completed * 100 / self.total).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::test_support::program_of;

    #[test]
    fn mark_is_idempotent() {
        let program = program_of(8, 2);
        let key = program.key_at(3).unwrap();
        let once = mark_completed(&program, &DailyCompletionSet::new(), key.clone()).unwrap();
        let twice = mark_completed(&program, &once, key).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn mark_reports_first_completion() {
        let program = program_of(8, 2);
        let mut set = DailyCompletionSet::new();
        let key = program.key_at(0).unwrap();
        assert!(set.mark(&program, key.clone()).unwrap());
        assert!(!set.mark(&program, key).unwrap());
    }

    #[test]
    fn mark_rejects_foreign_keys() {
        let program = program_of(2, 0);
        let other = program_of(8, 2).key_at(9).unwrap();
        let err = mark_completed(&program, &DailyCompletionSet::new(), other).unwrap_err();
        assert!(matches!(err, ProgressError::NotInProgram(_)));
    }

    #[test]
    fn complete_iff_superset() {
        let program = program_of(3, 1);
        let mut set = DailyCompletionSet::new();
        for (index, key) in program.keys().enumerate() {
            assert!(!is_complete(&program, &set), "complete too early at {index}");
            set.mark(&program, key).unwrap();
        }
        assert!(is_complete(&program, &set));
    }

    #[test]
    fn empty_program_is_complete() {
        let program = DailyProgram::default();
        assert!(is_complete(&program, &DailyCompletionSet::new()));
        let progress = DailyProgress::of(&program, &DailyCompletionSet::new());
        assert!(progress.is_complete);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn retain_program_drops_stale_keys() {
        let old = program_of(8, 2);
        let mut set = DailyCompletionSet::new();
        set.mark(&old, old.key_at(9).unwrap()).unwrap();
        set.mark(&old, old.key_at(0).unwrap()).unwrap();

        let short = program_of(4, 0);
        assert_eq!(set.retain_program(&short), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn progress_counts_short_program() {
        let program = program_of(3, 0);
        let mut set = DailyCompletionSet::new();
        set.mark(&program, program.key_at(1).unwrap()).unwrap();
        let progress = DailyProgress::of(&program, &set);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.percent(), 33);
    }

    #[test]
    fn serializes_as_key_array() {
        let program = program_of(2, 0);
        let mut set = DailyCompletionSet::new();
        set.mark(&program, program.key_at(0).unwrap()).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[\"cat-0\"]");
    }
}
