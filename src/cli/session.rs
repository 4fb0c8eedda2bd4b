//! Line commands for the interactive session.
//!
//! Plain lines are search text; lines starting with `:` are commands.

use std::time::Duration;

pub const SESSION_HELP: &str = "\
Type to search (empty: my open issues, number: issue id). Commands:
  :start | :stop             start or stop the timer
  :set <dur> | :sub <dur>    set or subtract time (e.g. 90, 15m, 1h)
  :time                      show the timer
  :status                    connection, search and timer state
  :again | :clear            re-run or clear the search
  :describe <id>             show an issue description
  :activities                list time entry activities
  :commit <issue> [activity] [comment]
  :refresh                   reload stored credentials
  :help | :quit";

/// One parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Search(String),
    Start,
    Stop,
    Set(Duration),
    Subtract(Duration),
    Time,
    Status,
    Again,
    Clear,
    Refresh,
    Describe(u64),
    Activities,
    Commit {
        issue_id: u64,
        activity_id: Option<u64>,
        comments: String,
    },
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse a line typed by the operator.
    ///
    /// # Errors
    /// Returns a usage message for unknown commands or bad arguments.
    pub fn parse(line: &str) -> Result<Self, String> {
        let Some(command) = line.strip_prefix(':') else {
            return Ok(Self::Search(line.to_string()));
        };

        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default();
        let rest: Vec<&str> = words.collect();

        match (name, rest.as_slice()) {
            ("start", []) => Ok(Self::Start),
            ("stop", []) => Ok(Self::Stop),
            ("set", [value]) => parse_duration(value).map(Self::Set),
            ("sub", [value]) => parse_duration(value).map(Self::Subtract),
            ("time", []) => Ok(Self::Time),
            ("status", []) => Ok(Self::Status),
            ("again", []) => Ok(Self::Again),
            ("clear", []) => Ok(Self::Clear),
            ("refresh", []) => Ok(Self::Refresh),
            ("describe", [id]) => parse_id(id).map(Self::Describe),
            ("activities", []) => Ok(Self::Activities),
            ("commit", [issue, tail @ ..]) => {
                let issue_id = parse_id(issue)?;
                let (activity_id, comment_words) = match tail {
                    [first, others @ ..] if first.parse::<u64>().is_ok() => {
                        (first.parse().ok(), others)
                    }
                    words => (None, words),
                };
                Ok(Self::Commit {
                    issue_id,
                    activity_id,
                    comments: comment_words.join(" "),
                })
            }
            ("help" | "h", []) => Ok(Self::Help),
            ("quit" | "q", []) => Ok(Self::Quit),
            _ => Err(format!("Unknown command: {line} (try :help)")),
        }
    }
}

fn parse_id(value: &str) -> Result<u64, String> {
    value
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("Not an issue id: {value}"))
}

/// Parse `90`, `90s`, `15m` or `2h` into a duration.
fn parse_duration(value: &str) -> Result<Duration, String> {
    let (digits, unit) = match value.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => value.split_at(i),
        None => (value, "s"),
    };
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("Not a duration: {value}"))?;
    let scale = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        _ => return Err(format!("Unknown duration unit in {value} (use s, m or h)")),
    };
    amount
        .checked_mul(scale)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration too long: {value}"))
}
