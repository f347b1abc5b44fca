mod cache;
mod navigation;
mod plan;
mod progress;
mod session;
mod workflow;

// Public API of the daily-program subsystem.
pub use crate::error::{DailyServiceError, DailySessionError, ProgressError};
pub use cache::{CachedDay, DailyCache, StaleReason};
pub use navigation::{next_incomplete, skip};
pub use plan::{
    DailyProgram, DailyProgramBuilder, GRAMMAR_PER_DAY, MAX_DAILY_ITEMS, PHRASES_PER_DAY,
};
pub use progress::{DailyCompletionSet, DailyProgress, is_complete, mark_completed};
pub use session::{AnswerOutcome, AnsweredItem, DailySession, SessionStatus};
pub use workflow::{
    DailyAnswerResult, DailyCompleteSignal, DailyLoopService, DailyState, ProgramSource,
};
