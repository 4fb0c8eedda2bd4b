//! Fakes shared by the application-layer tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::application::Navigator;
use crate::domain::{
    ApiConnector, ApiHandle, AppError, Credentials, IdAndName, Issue, IssueParams, Query,
    RedmineApi, Result, TimeEntry,
};

/// Search text that makes [`FakeApi`] fail with a transport error.
pub const FAILING_SEARCH: &str = "boom";

/// In-memory Redmine that echoes the search term back as an issue subject.
#[derive(Default)]
pub struct FakeApi {
    queries: Mutex<Vec<String>>,
    delays: HashMap<String, Duration>,
    entries: Mutex<Vec<TimeEntry>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delay the response for a given search term.
    pub fn with_delays(delays: &[(&str, Duration)]) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(term, delay)| ((*term).to_string(), *delay))
                .collect(),
            ..Self::default()
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn term(query: &Query) -> String {
        if let Some(id) = query.param("issue_id") {
            return id.values().join(",");
        }
        query
            .filter_values("subject")
            .first()
            .map_or_else(String::new, |s| (*s).to_string())
    }
}

#[async_trait]
impl RedmineApi for FakeApi {
    async fn list_issues(&self, params: &IssueParams) -> Result<Vec<Issue>> {
        Ok(params
            .issue_id
            .map(|id| Issue {
                id,
                description: format!("Description of #{id}"),
                subject: format!("Issue {id}"),
                tracker: IdAndName {
                    id: 1,
                    name: "Bug".into(),
                    is_default: None,
                },
            })
            .into_iter()
            .collect())
    }

    async fn list_enumeration(&self, name: &str) -> Result<Vec<IdAndName>> {
        if name != "time_entry_activities" {
            return Err(AppError::transport("404 Not Found"));
        }
        Ok(vec![
            IdAndName {
                id: 8,
                name: "Design".into(),
                is_default: None,
            },
            IdAndName {
                id: 9,
                name: "Development".into(),
                is_default: Some(true),
            },
        ])
    }

    async fn run_query(&self, query: &Query) -> Result<serde_json::Value> {
        self.queries.lock().unwrap().push(query.to_wire());
        let term = Self::term(query);
        if let Some(delay) = self.delays.get(&term) {
            tokio::time::sleep(*delay).await;
        }
        if term == FAILING_SEARCH {
            return Err(AppError::transport("connection refused"));
        }
        let subject = if term.is_empty() { "mine" } else { term.as_str() };
        Ok(json!({
            "issues": [
                {"id": 1, "subject": subject, "tracker": {"id": 1, "name": "Bug"}}
            ]
        }))
    }

    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Connector returning a fixed fake, or "not configured" when empty.
pub struct FakeConnector {
    pub api: Mutex<Option<Arc<FakeApi>>>,
}

impl FakeConnector {
    pub fn new(api: Option<Arc<FakeApi>>) -> Arc<Self> {
        Arc::new(Self {
            api: Mutex::new(api),
        })
    }

    pub fn set(&self, api: Option<Arc<FakeApi>>) {
        *self.api.lock().unwrap() = api;
    }
}

impl ApiConnector for FakeConnector {
    fn connect(&self) -> Result<ApiHandle> {
        self.api
            .lock()
            .unwrap()
            .clone()
            .map(|api| api as ApiHandle)
            .ok_or(AppError::NotConfigured)
    }

    fn connect_with(&self, _credentials: &Credentials) -> Result<ApiHandle> {
        Ok(FakeApi::new())
    }
}

/// Navigator counting redirects.
#[derive(Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_config(&self, _reason: &str) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
