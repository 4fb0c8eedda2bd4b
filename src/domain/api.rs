//! The Redmine API boundary.
//!
//! Pipelines only ever see an [`ApiHandle`]; how it talks HTTP is the
//! infrastructure layer's concern.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::Result;
use super::models::{Credentials, IdAndName, Issue, IssueParams, TimeEntry};
use super::query::Query;

/// Operations offered by a configured Redmine connection.
///
/// Failures are either [`AppError::Transport`](super::AppError::Transport)
/// or [`AppError::Unclassified`](super::AppError::Unclassified).
#[async_trait]
pub trait RedmineApi: Send + Sync {
    /// List issues matching the given paging/lookup parameters.
    async fn list_issues(&self, params: &IssueParams) -> Result<Vec<Issue>>;

    /// List an enumeration such as `time_entry_activities`.
    async fn list_enumeration(&self, name: &str) -> Result<Vec<IdAndName>>;

    /// Run an arbitrary GET query and return the decoded body.
    async fn run_query(&self, query: &Query) -> Result<serde_json::Value>;

    /// Create a time entry.
    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<()>;
}

/// Shared, replaceable capability to talk to Redmine.
pub type ApiHandle = Arc<dyn RedmineApi>;

/// Derives API handles from credentials.
pub trait ApiConnector: Send + Sync {
    /// Derive a handle from the stored credentials.
    ///
    /// # Errors
    /// Returns [`AppError::NotConfigured`](super::AppError::NotConfigured)
    /// when no credentials are stored, or a config error when they are
    /// unreadable.
    fn connect(&self) -> Result<ApiHandle>;

    /// Derive a handle from explicit credentials.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    fn connect_with(&self, credentials: &Credentials) -> Result<ApiHandle>;
}
