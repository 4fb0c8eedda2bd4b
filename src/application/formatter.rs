//! Output formatting for search results, activities and the timer.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{Hms, IdAndName, IssueHead, SearchOutcome};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Compact table listing.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// Formats issue summaries as a table.
pub fn format_issue_table(issues: &[IssueHead]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Tracker", "Subject"]);

    for issue in issues {
        table.add_row(vec![
            issue.id.to_string(),
            issue.tracker.clone(),
            truncate(&issue.title, 60),
        ]);
    }

    table.to_string()
}

/// Formats a search outcome: the result list, or the error in its place.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_outcome(
    outcome: &SearchOutcome,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match outcome {
        Err(message) => Ok(format!("{} {}", "✗".red().bold(), message.red())),
        Ok(issues) if issues.is_empty() => Ok("No issues found".dimmed().to_string()),
        Ok(issues) => match format {
            OutputFormat::Table => Ok(format_issue_table(issues)),
            OutputFormat::Json => serde_json::to_string_pretty(issues),
        },
    }
}

/// Formats time entry activities, marking the default.
pub fn format_activities(activities: &[IdAndName]) -> String {
    activities
        .iter()
        .map(|a| {
            let marker = if a.is_default == Some(true) {
                " (default)".green().to_string()
            } else {
                String::new()
            };
            format!("{:>4}  {}{marker}", a.id, a.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the timer display line.
pub fn format_timer(secs: u64, running: bool) -> String {
    let clock = Hms::from_secs(secs).to_string();
    if running {
        format!("{} {}", "●".green(), clock.bold())
    } else {
        format!("{} {}", "■".yellow(), clock)
    }
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}
