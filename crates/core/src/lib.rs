#![forbid(unsafe_code)]

pub mod answer;
pub mod error;
pub mod model;
pub mod rewards;
pub mod time;

pub use error::Error;
pub use time::{CalendarDay, Clock};
