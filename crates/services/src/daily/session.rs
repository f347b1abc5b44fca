use std::fmt;

use svenska_core::model::{CompositeKey, ExerciseItem};

use super::navigation::{next_incomplete, skip};
use super::plan::DailyProgram;
use super::progress::{DailyCompletionSet, DailyProgress};
use crate::error::DailySessionError;

//
// ─── STATUS & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where the learner is within today's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Program loaded, nothing on screen.
    Idle,
    /// The item at this index is on screen.
    Presented(usize),
    /// Every item is complete; terminal until the day rolls over.
    DayComplete,
}

/// The item that was just answered correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredItem {
    pub index: usize,
    pub key: CompositeKey,
    /// False when the item had already been completed earlier today.
    pub newly_completed: bool,
}

/// Result of answering the presented item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Wrong answer; the same item stays on screen.
    Retry { index: usize },
    /// Correct answer; `next` is now presented.
    Advanced { answered: AnsweredItem, next: usize },
    /// Correct answer that finished the program.
    DayComplete { answered: AnsweredItem },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory walk through one day's program.
///
/// Owns the program and today's completion set; persistence is the caller's job.
#[derive(Clone, PartialEq, Eq)]
pub struct DailySession {
    program: DailyProgram,
    completion: DailyCompletionSet,
    status: SessionStatus,
}

impl DailySession {
    /// Wrap a program and its completion set. Keys outside the program are dropped.
    #[must_use]
    pub fn new(program: DailyProgram, mut completion: DailyCompletionSet) -> Self {
        let dropped = completion.retain_program(&program);
        if dropped > 0 {
            tracing::debug!(dropped, "discarded completion keys not in today's program");
        }
        Self {
            program,
            completion,
            status: SessionStatus::Idle,
        }
    }

    #[must_use]
    pub fn program(&self) -> &DailyProgram {
        &self.program
    }

    #[must_use]
    pub fn completion(&self) -> &DailyCompletionSet {
        &self.completion
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn progress(&self) -> DailyProgress {
        DailyProgress::of(&self.program, &self.completion)
    }

    #[must_use]
    pub fn is_day_complete(&self) -> bool {
        self.status == SessionStatus::DayComplete
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.status {
            SessionStatus::Presented(index) => Some(index),
            SessionStatus::Idle | SessionStatus::DayComplete => None,
        }
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&ExerciseItem> {
        self.current_index().and_then(|index| self.program.get(index))
    }

    /// Present the first open item, or enter the terminal state.
    pub fn resume(&mut self) -> SessionStatus {
        self.status = match next_incomplete(&self.program, &self.completion) {
            Some(index) => SessionStatus::Presented(index),
            None => SessionStatus::DayComplete,
        };
        self.status
    }

    /// Present a specific item, e.g. when the learner picks it from the list.
    ///
    /// # Errors
    ///
    /// Returns `DailySessionError::OutOfRange` for an invalid index and
    /// `DailySessionError::DayComplete` once the day is finished.
    pub fn present(&mut self, index: usize) -> Result<&ExerciseItem, DailySessionError> {
        if self.is_day_complete() {
            return Err(DailySessionError::DayComplete);
        }
        let len = self.program.len();
        let item = self
            .program
            .get(index)
            .ok_or(DailySessionError::OutOfRange { index, len })?;
        self.status = SessionStatus::Presented(index);
        Ok(item)
    }

    /// Record an answer for the presented item.
    ///
    /// # Errors
    ///
    /// Returns `DailySessionError::NotPresented` when nothing is on screen and
    /// `DailySessionError::DayComplete` after the program finished.
    pub fn answer(&mut self, correct: bool) -> Result<AnswerOutcome, DailySessionError> {
        let index = self.presented_index()?;
        if !correct {
            return Ok(AnswerOutcome::Retry { index });
        }

        let len = self.program.len();
        let key = self
            .program
            .key_at(index)
            .ok_or(DailySessionError::OutOfRange { index, len })?;
        let newly_completed = self.completion.mark(&self.program, key.clone())?;
        let answered = AnsweredItem {
            index,
            key,
            newly_completed,
        };

        match self.resume() {
            SessionStatus::Presented(next) => Ok(AnswerOutcome::Advanced { answered, next }),
            SessionStatus::DayComplete | SessionStatus::Idle => {
                Ok(AnswerOutcome::DayComplete { answered })
            }
        }
    }

    /// Move past the presented item without answering it.
    ///
    /// Returns the newly presented index.
    ///
    /// # Errors
    ///
    /// Returns `DailySessionError::NotPresented` when nothing is on screen and
    /// `DailySessionError::DayComplete` after the program finished.
    pub fn skip(&mut self) -> Result<usize, DailySessionError> {
        let current = self.presented_index()?;
        match skip(&self.program, &self.completion, current) {
            Some(next) => {
                self.status = SessionStatus::Presented(next);
                Ok(next)
            }
            None => {
                self.status = SessionStatus::DayComplete;
                Err(DailySessionError::DayComplete)
            }
        }
    }

    /// Leave the program screen without losing progress.
    pub fn leave(&mut self) {
        if let SessionStatus::Presented(_) = self.status {
            self.status = SessionStatus::Idle;
        }
    }

    fn presented_index(&self) -> Result<usize, DailySessionError> {
        match self.status {
            SessionStatus::Presented(index) => Ok(index),
            SessionStatus::Idle => Err(DailySessionError::NotPresented),
            SessionStatus::DayComplete => Err(DailySessionError::DayComplete),
        }
    }
}

impl fmt::Debug for DailySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DailySession")
            .field("items_len", &self.program.len())
            .field("completed_len", &self.completion.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
