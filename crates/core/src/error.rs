use thiserror::Error;

use crate::model::{CatalogError, DifficultyError, ParseIdError, ProfileError};
use crate::time::CalendarDayError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Day(#[from] CalendarDayError),
}
