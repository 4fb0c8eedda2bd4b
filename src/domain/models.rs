//! Domain models for Redmine issues and time entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};
use super::query::Query;

/// Maximum length Redmine accepts for a time entry comment.
pub const MAX_COMMENT_LEN: usize = 255;

/// An `{id, name}` pair as returned for trackers and enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAndName {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// An issue as returned by `issues.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    pub tracker: IdAndName,
}

/// Compact issue summary shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueHead {
    pub id: u64,
    pub tracker: String,
    pub title: String,
}

impl From<Issue> for IssueHead {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            tracker: issue.tracker.name,
            title: issue.subject,
        }
    }
}

/// Outcome of one search: the issue list or the failure text.
pub type SearchOutcome = std::result::Result<Vec<IssueHead>, String>;

/// Paging and lookup parameters for listing issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
    pub issue_id: Option<u64>,
}

impl IssueParams {
    /// Parameters looking up a single issue by id.
    #[must_use]
    pub fn by_id(issue_id: u64) -> Self {
        Self {
            issue_id: Some(issue_id),
            ..Self::default()
        }
    }

    /// Build the `issues` query carrying these parameters.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new("issues");
        if let Some(offset) = self.offset {
            query = query.with_param("offset", offset.to_string());
        }
        if let Some(limit) = self.limit {
            query = query.with_param("limit", limit.to_string());
        }
        if let Some(sort) = &self.sort {
            query = query.with_param("sort", sort.as_str());
        }
        if let Some(issue_id) = self.issue_id {
            query = query.with_param("issue_id", issue_id.to_string());
        }
        query
    }
}

/// A time entry submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEntry {
    pub issue_id: u64,
    /// Defaults to the current date on the server when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_on: Option<NaiveDate>,
    pub hours: f64,
    pub activity_id: u64,
    pub comments: String,
}

impl TimeEntry {
    /// Create a time entry, rejecting over-long comments.
    ///
    /// # Errors
    /// Returns error if `comments` exceeds [`MAX_COMMENT_LEN`] characters.
    pub fn new(
        issue_id: u64,
        hours: f64,
        activity_id: u64,
        comments: impl Into<String>,
        spent_on: Option<NaiveDate>,
    ) -> Result<Self> {
        let comments = comments.into();
        if comments.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::InvalidInput {
                message: format!("comment longer than {MAX_COMMENT_LEN} characters"),
            });
        }
        Ok(Self {
            issue_id,
            spent_on,
            hours,
            activity_id,
            comments,
        })
    }
}

/// Stored Redmine credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Validate the form: every field required and the confirmation equal
    /// to the password.
    ///
    /// # Errors
    /// Returns error naming the first failing field.
    pub fn validate(&self, password_confirm: &str) -> Result<()> {
        for (field, value) in [
            ("url", &self.url),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::InvalidInput {
                    message: format!("{field} is required"),
                });
            }
        }
        if self.password != password_confirm {
            return Err(AppError::InvalidInput {
                message: "passwords do not match".into(),
            });
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            url: "https://redmine.example.com/".into(),
            username: "alice".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_issue_head_from_issue() {
        let issue: Issue = serde_json::from_str(
            r#"{"id": 42, "subject": "Fix login", "tracker": {"id": 1, "name": "Bug"}}"#,
        )
        .unwrap();

        let head = IssueHead::from(issue);
        assert_eq!(head.id, 42);
        assert_eq!(head.tracker, "Bug");
        assert_eq!(head.title, "Fix login");
    }

    #[test]
    fn test_issue_params_query() {
        let params = IssueParams {
            limit: Some(1),
            issue_id: Some(7),
            ..IssueParams::default()
        };
        assert_eq!(params.to_query().to_wire(), "issues.json?limit=1&issue_id=7");
    }

    #[test]
    fn test_time_entry_serialization_skips_missing_date() {
        let entry = TimeEntry::new(42, 1.5, 9, "review", None).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"issue_id": 42, "hours": 1.5, "activity_id": 9, "comments": "review"})
        );
    }

    #[test]
    fn test_time_entry_rejects_long_comment() {
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(TimeEntry::new(1, 1.0, 1, long, None).is_err());
    }

    #[test]
    fn test_credentials_validation() {
        let creds = credentials();
        assert!(creds.validate("secret").is_ok());
        assert!(creds.validate("other").is_err());

        let missing = Credentials {
            username: " ".into(),
            ..credentials()
        };
        assert!(missing.validate("secret").is_err());
    }

    #[test]
    fn test_base_url_trims_slash() {
        assert_eq!(credentials().base_url(), "https://redmine.example.com");
    }
}
