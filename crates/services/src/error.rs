//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use svenska_core::model::{CategoryId, CompositeKey, ProfileError};

/// Errors emitted by the daily completion tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("{0} is not part of today's program")]
    NotInProgram(CompositeKey),
}

/// Errors emitted by the in-memory daily session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DailySessionError {
    #[error("no exercise is being presented")]
    NotPresented,
    #[error("today's program is already complete")]
    DayComplete,
    #[error("exercise index {index} is out of range for a program of {len}")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted by `DailyLoopService`.
///
/// Local-store failures never show up here; only the account store can fail
/// an operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DailyServiceError {
    #[error(transparent)]
    Session(#[from] DailySessionError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
    #[error("no phrases match the current filters")]
    Empty,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] svenska_core::model::CatalogError),
}
