//! Domain layer - core types, the query builder and the timer fold.
//!
//! This layer contains pure domain models and error types
//! without any I/O.

pub mod api;
pub mod error;
pub mod models;
pub mod query;
pub mod settings;
pub mod timer;

pub use api::{ApiConnector, ApiHandle, RedmineApi};
pub use error::{AppError, Result};
pub use models::{
    Credentials, IdAndName, Issue, IssueHead, IssueParams, SearchOutcome, TimeEntry,
};
pub use query::Query;
pub use settings::{AppConfig, SessionConfig};
pub use timer::{secs_to_hours, Hms, TimerCommand, TimerState};
