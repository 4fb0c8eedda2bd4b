//! Session runtime wiring the API handle cell to the timer and search.
//!
//! The runtime owns the single replaceable API handle slot. `refresh` is
//! its only writer; the search pipeline and the submission paths read it.
//! The search pipeline is spawned on first use, so one-shot commands never
//! issue its startup query. Dropping the runtime tears down the timer ticks
//! and any in-flight search.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::domain::{
    secs_to_hours, ApiConnector, ApiHandle, AppError, Credentials, IdAndName, IssueParams,
    Result, SearchOutcome, SessionConfig, TimeEntry,
};

use super::navigator::Navigator;
use super::search::{search_once, SearchPipeline};
use super::timer_engine::TimerEngine;

/// Enumeration holding time entry activities.
const ACTIVITIES: &str = "time_entry_activities";

/// Metadata for committing tracked time to an issue.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    pub issue_id: u64,
    /// Falls back to the default activity when absent.
    pub activity_id: Option<u64>,
    pub comments: String,
    pub spent_on: Option<NaiveDate>,
}

/// A live operator session.
pub struct SessionRuntime {
    connector: Arc<dyn ApiConnector>,
    navigator: Arc<dyn Navigator>,
    handle: watch::Sender<Option<ApiHandle>>,
    timer: TimerEngine,
    debounce: Duration,
    search: OnceLock<SearchPipeline>,
}

impl SessionRuntime {
    /// Build a session, deriving the initial handle from stored credentials.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: &SessionConfig,
        connector: Arc<dyn ApiConnector>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let handle = watch::Sender::new(derive_handle(connector.as_ref()));
        let timer = TimerEngine::spawn(config.tick());

        tracing::info!(configured = handle.borrow().is_some(), "Session started");

        Self {
            connector,
            navigator,
            handle,
            timer,
            debounce: config.debounce(),
            search: OnceLock::new(),
        }
    }

    /// Re-derive the API handle from the stored credentials.
    ///
    /// On success every dependent pipeline switches to the new handle. On
    /// failure the previous handle stays in place and the navigator is asked
    /// to redirect to configuration. Returns whether a handle was derived.
    pub fn refresh(&self) -> bool {
        match derive_handle(self.connector.as_ref()) {
            Some(api) => {
                self.handle.send_replace(Some(api));
                tracing::info!("API handle refreshed");
                true
            }
            None => {
                self.navigator.redirect_to_config("Redmine not configured");
                false
            }
        }
    }

    /// Whether an API handle is currently available.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.handle.borrow().is_some()
    }

    #[must_use]
    pub const fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    /// The live search pipeline, spawned on first call.
    ///
    /// Its first run searches for the empty string and reports a missing
    /// handle to the navigator.
    pub fn search(&self) -> &SearchPipeline {
        self.search.get_or_init(|| {
            SearchPipeline::spawn(
                self.handle.subscribe(),
                Arc::clone(&self.navigator),
                self.debounce,
            )
        })
    }

    fn api(&self) -> Result<ApiHandle> {
        let current = self.handle.borrow().clone();
        current.ok_or_else(|| {
            self.navigator.redirect_to_config("Redmine not configured");
            AppError::NotConfigured
        })
    }

    /// Description of an issue, or empty when it does not exist.
    ///
    /// # Errors
    /// Returns error if not configured or the request fails.
    pub async fn describe(&self, issue_id: u64) -> Result<String> {
        let issues = self.api()?.list_issues(&IssueParams::by_id(issue_id)).await?;
        Ok(issues
            .into_iter()
            .next()
            .map(|issue| issue.description)
            .unwrap_or_default())
    }

    /// Available time entry activities.
    ///
    /// # Errors
    /// Returns error if not configured or the request fails.
    pub async fn activities(&self) -> Result<Vec<IdAndName>> {
        self.api()?.list_enumeration(ACTIVITIES).await
    }

    /// Submit the timer's elapsed time as a time entry.
    ///
    /// The elapsed duration is read at submission time; the timer itself is
    /// left untouched.
    ///
    /// # Errors
    /// Returns error if not configured, no activity can be chosen, the
    /// comment is too long or the request fails.
    pub async fn commit(&self, request: CommitRequest) -> Result<TimeEntry> {
        let api = self.api()?;

        let activity_id = match request.activity_id {
            Some(id) => id,
            None => default_activity(&api.list_enumeration(ACTIVITIES).await?)?,
        };

        let secs = self.timer.elapsed_secs();
        let entry = TimeEntry::new(
            request.issue_id,
            secs_to_hours(secs),
            activity_id,
            request.comments,
            request.spent_on,
        )?;

        api.create_time_entry(&entry).await?;
        tracing::info!(
            issue_id = entry.issue_id,
            hours = entry.hours,
            activity_id,
            "Time entry created"
        );

        Ok(entry)
    }

    /// Run one search immediately, bypassing debounce and the shared
    /// result channel.
    ///
    /// # Errors
    /// Returns error only when not configured; request failures land in the
    /// outcome's error arm.
    pub async fn search_now(&self, text: &str) -> Result<SearchOutcome> {
        let api = self.api()?;
        Ok(search_once(api.as_ref(), text).await)
    }

    /// Convenience for setting the timer from whole minutes.
    ///
    /// # Errors
    /// Returns error if the minutes do not fit in a duration.
    pub async fn set_minutes(&self, minutes: u64) -> Result<()> {
        let secs = minutes
            .checked_mul(60)
            .ok_or_else(|| AppError::InvalidInput {
                message: format!("{minutes} minutes is too long"),
            })?;
        self.timer.set_duration(Duration::from_secs(secs)).await;
        Ok(())
    }
}

/// Probe explicit credentials with a minimal issue listing.
///
/// # Errors
/// Returns the transport or API failure from the probe.
pub async fn test_login(connector: &dyn ApiConnector, credentials: &Credentials) -> Result<()> {
    let api = connector.connect_with(credentials)?;
    let probe = IssueParams {
        limit: Some(1),
        ..IssueParams::default()
    };
    api.list_issues(&probe).await.map(|_| ())
}

fn derive_handle(connector: &dyn ApiConnector) -> Option<ApiHandle> {
    match connector.connect() {
        Ok(api) => Some(api),
        Err(AppError::NotConfigured) => {
            tracing::warn!("No stored credentials");
            None
        }
        Err(e) => {
            tracing::warn!("Failed to derive API handle: {}", e);
            None
        }
    }
}

/// Pick the activity flagged as default.
fn default_activity(activities: &[IdAndName]) -> Result<u64> {
    activities
        .iter()
        .find(|a| a.is_default == Some(true))
        .map(|a| a.id)
        .ok_or_else(|| AppError::InvalidInput {
            message: "no default activity, pass one explicitly".into(),
        })
}
