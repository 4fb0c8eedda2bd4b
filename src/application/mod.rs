//! Application layer - live pipelines and session orchestration.
//!
//! The timer engine and the search pipeline run as tokio tasks owned by a
//! [`SessionRuntime`]; formatting helpers turn their state into output.

pub mod formatter;
pub mod navigator;
pub mod search;
pub mod session;
pub mod timer_engine;

#[cfg(test)]
pub(crate) mod testing;

pub use formatter::{format_activities, format_outcome, format_timer, OutputFormat};
pub use navigator::Navigator;
pub use session::{test_login, CommitRequest, SessionRuntime};
