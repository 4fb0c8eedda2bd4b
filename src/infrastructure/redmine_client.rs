//! HTTP implementation of the Redmine API.
//!
//! Every request uses HTTP basic auth from the stored credentials. Request,
//! connection and status failures are transport errors; responses that do
//! not decode are unclassified.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::domain::{
    ApiConnector, ApiHandle, AppError, Credentials, IdAndName, Issue, IssueParams, Query,
    RedmineApi, Result, TimeEntry,
};

use super::credentials::load_credentials;

/// Redmine REST client bound to one set of credentials.
pub struct RedmineClient {
    http: Client,
    credentials: Credentials,
}

impl RedmineClient {
    /// Build a client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::transport)?;
        Ok(Self { http, credentials })
    }

    fn url(&self, query: &Query) -> String {
        format!("{}/{}", self.credentials.base_url(), query.to_wire())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn get(&self, query: &Query) -> Result<Value> {
        let url = self.url(query);
        tracing::debug!(url = %url, "Running get query");

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(AppError::transport)?;

        response.json().await.map_err(AppError::unclassified)
    }

    async fn post(&self, query: &Query, body: &Value) -> Result<()> {
        let url = self.url(query);
        tracing::debug!(url = %url, "Running post query");

        self.authorized(self.http.post(&url))
            .json(body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(AppError::transport)?;

        Ok(())
    }
}

/// Decode the array stored under `key` in a response body.
fn field<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T> {
    let value = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| AppError::unclassified(format!("response has no `{key}` field")))?;
    serde_json::from_value(value).map_err(AppError::unclassified)
}

#[async_trait]
impl RedmineApi for RedmineClient {
    async fn list_issues(&self, params: &IssueParams) -> Result<Vec<Issue>> {
        let body = self.get(&params.to_query()).await?;
        field(body, "issues")
    }

    async fn list_enumeration(&self, name: &str) -> Result<Vec<IdAndName>> {
        let body = self.get(&Query::new(format!("enumerations/{name}"))).await?;
        field(body, name)
    }

    async fn run_query(&self, query: &Query) -> Result<Value> {
        self.get(query).await
    }

    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        let entry = serde_json::to_value(entry).map_err(AppError::json_parse)?;
        self.post(&Query::new("time_entries"), &json!({ "time_entry": entry }))
            .await
    }
}

/// Derives clients from the credentials file.
pub struct FileConnector {
    credentials_path: PathBuf,
    timeout: Duration,
}

impl FileConnector {
    #[must_use]
    pub const fn new(credentials_path: PathBuf, timeout: Duration) -> Self {
        Self {
            credentials_path,
            timeout,
        }
    }
}

impl ApiConnector for FileConnector {
    fn connect(&self) -> Result<ApiHandle> {
        let credentials = load_credentials(&self.credentials_path)?.ok_or(AppError::NotConfigured)?;
        self.connect_with(&credentials)
    }

    fn connect_with(&self, credentials: &Credentials) -> Result<ApiHandle> {
        let client = RedmineClient::new(credentials.clone(), self.timeout)?;
        Ok(Arc::new(client))
    }
}
