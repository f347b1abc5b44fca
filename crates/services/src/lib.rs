#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod daily;
pub mod error;
pub mod practice_service;
pub mod profile_service;

pub use svenska_core::Clock;

pub use app_services::AppServices;
pub use config::DailyConfig;
pub use error::{
    AppServicesError, DailyServiceError, DailySessionError, PracticeError, ProfileServiceError,
    ProgressError,
};
pub use practice_service::PracticeService;
pub use profile_service::{ProfileOverview, ProfileService};

pub use daily::{
    AnswerOutcome, DailyAnswerResult, DailyCache, DailyCompleteSignal, DailyLoopService,
    DailyProgram, DailyProgress, DailyState, ProgramSource, SessionStatus,
};
