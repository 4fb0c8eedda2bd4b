//! Debounced, cancellable issue search.
//!
//! Keystrokes are debounced, the settled text is classified into an issue
//! query and run against the current API handle. Only the newest request
//! may publish: each request carries a generation number, superseded ones
//! are aborted, and a late result whose generation is stale is dropped.
//! Results are published on a `watch` channel so every observer shares one
//! upstream request and late observers immediately see the latest outcome.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};

use crate::domain::{
    ApiHandle, AppError, Issue, IssueHead, Query, RedmineApi, Result, SearchOutcome,
};

use super::navigator::Navigator;

/// Classify raw search text into an issue query.
///
/// Empty text lists open issues assigned to the operator, other text adds a
/// subject substring filter, and a number looks the issue up directly.
#[must_use]
pub fn issue_query(search: &str) -> Query {
    let base = Query::new("issues");
    if is_numeric(search) {
        return base.with_param("issue_id", search);
    }

    let mine = base
        .add_filter("assigned_to_id", "=", Some("me"))
        .add_filter("status_id", "o", None);
    if search.is_empty() {
        mine
    } else {
        mine.add_filter("subject", "~", Some(search))
    }
}

/// Finite decimal numbers only. Hex literals, `inf` and blank text are
/// searched as subject text.
fn is_numeric(search: &str) -> bool {
    let trimmed = search.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

#[derive(Debug)]
enum SearchInput {
    Text(String),
    Again,
}

/// Handle to a running search pipeline. Dropping it cancels everything.
pub struct SearchPipeline {
    input: mpsc::UnboundedSender<SearchInput>,
    text: watch::Sender<String>,
    results: watch::Receiver<Option<SearchOutcome>>,
    task: JoinHandle<()>,
}

impl SearchPipeline {
    /// Spawn the pipeline. It searches for the empty string right away.
    #[must_use]
    pub fn spawn(
        handles: watch::Receiver<Option<ApiHandle>>,
        navigator: Arc<dyn Navigator>,
        debounce: Duration,
    ) -> Self {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (results_tx, results) = watch::channel(None);

        let worker = Worker {
            handles,
            navigator,
            results: results_tx,
            current: String::new(),
            generation: 0,
            in_flight: JoinSet::new(),
        };
        let task = tokio::spawn(worker.run(input_rx, debounce));

        Self {
            input,
            text: watch::Sender::new(String::new()),
            results,
            task,
        }
    }

    /// Feed raw search text, as typed.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.text.send_replace(text.clone());
        let _ = self.input.send(SearchInput::Text(text));
    }

    /// Reset the search text to empty.
    pub fn clear(&self) {
        self.set_text(String::new());
    }

    /// Re-run the last settled search without changing the text.
    pub fn search_again(&self) {
        let _ = self.input.send(SearchInput::Again);
    }

    /// Whether there is search text to clear.
    #[must_use]
    pub fn show_cancel(&self) -> bool {
        !self.text.borrow().is_empty()
    }

    /// Observe search outcomes. `None` until the first result arrives.
    #[must_use]
    pub fn results(&self) -> watch::Receiver<Option<SearchOutcome>> {
        self.results.clone()
    }

    #[must_use]
    pub fn latest(&self) -> Option<SearchOutcome> {
        self.results.borrow().clone()
    }

    /// Issues from the latest outcome, if it succeeded.
    #[must_use]
    pub fn issues(&self) -> Option<Vec<IssueHead>> {
        self.latest().and_then(std::result::Result::ok)
    }

    /// Error text from the latest outcome, or empty.
    #[must_use]
    pub fn error(&self) -> String {
        match &*self.results.borrow() {
            Some(Err(message)) => message.clone(),
            _ => String::new(),
        }
    }
}

impl Drop for SearchPipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Worker {
    handles: watch::Receiver<Option<ApiHandle>>,
    navigator: Arc<dyn Navigator>,
    results: watch::Sender<Option<SearchOutcome>>,
    current: String,
    generation: u64,
    in_flight: JoinSet<(u64, SearchOutcome)>,
}

impl Worker {
    async fn run(mut self, mut input: mpsc::UnboundedReceiver<SearchInput>, debounce: Duration) {
        self.issue();
        let mut pending: Option<(String, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, at)| *at);
            tokio::select! {
                received = input.recv() => match received {
                    Some(SearchInput::Text(text)) => {
                        pending = Some((text, Instant::now() + debounce));
                    }
                    Some(SearchInput::Again) => self.issue(),
                    None => break,
                },
                () = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((text, _)) = pending.take() {
                        tracing::debug!(search = %text, "Search text settled");
                        self.current = text;
                        self.issue();
                    }
                }
                changed = self.handles.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    tracing::debug!("API handle replaced, re-running search");
                    self.issue();
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((generation, outcome)) => self.deliver(generation, outcome),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => tracing::warn!("Search request task failed: {}", e),
                    }
                }
            }
        }
    }

    /// Start a request for the current text, superseding any in flight.
    fn issue(&mut self) {
        self.generation += 1;
        self.in_flight.abort_all();

        let handle = self.handles.borrow_and_update().clone();
        let Some(api) = handle else {
            tracing::warn!("Search skipped, Redmine not configured");
            self.navigator.redirect_to_config("Redmine not configured");
            return;
        };

        let query = issue_query(&self.current);
        let generation = self.generation;
        tracing::debug!(generation, query = %query, "Running search");
        self.in_flight.spawn(async move {
            let outcome = fetch_issue_heads(api.as_ref(), &query).await;
            (generation, outcome)
        });
    }

    fn deliver(&self, generation: u64, outcome: SearchOutcome) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Dropping stale search result");
            return;
        }
        self.results.send_replace(Some(outcome));
    }
}

/// Classify `text` and run it once against `api`.
pub async fn search_once(api: &dyn RedmineApi, text: &str) -> SearchOutcome {
    fetch_issue_heads(api, &issue_query(text)).await
}

#[derive(Deserialize)]
struct IssuesBody {
    issues: Vec<Issue>,
}

async fn fetch_issue_heads(api: &dyn RedmineApi, query: &Query) -> SearchOutcome {
    let body = api
        .run_query(query)
        .await
        .map_err(|e| e.display_message())?;
    decode_issue_heads(body).map_err(|e| e.display_message())
}

fn decode_issue_heads(body: serde_json::Value) -> Result<Vec<IssueHead>> {
    let body: IssuesBody = serde_json::from_value(body).map_err(AppError::unclassified)?;
    Ok(body.issues.into_iter().map(IssueHead::from).collect())
}
