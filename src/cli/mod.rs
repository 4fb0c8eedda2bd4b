//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

pub mod session;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

pub use session::{SessionCommand, SESSION_HELP};

/// redtime - search Redmine issues and log work time from the terminal.
#[derive(Parser, Debug)]
#[command(name = "redtime")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format for search results: table or json.
    #[arg(short, long, default_value = "table")]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store Redmine credentials after checking they work.
    Config {
        /// Redmine base URL.
        #[arg(long)]
        url: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Password confirmation (defaults to the password).
        #[arg(long)]
        password_confirm: Option<String>,

        /// Save without probing the server.
        #[arg(long)]
        no_test: bool,
    },

    /// Forget the stored credentials.
    Logout,

    /// Search issues once (empty: my open issues, number: issue id).
    Search {
        /// Search text.
        #[arg(default_value = "")]
        text: String,
    },

    /// Show the description of an issue.
    Describe {
        /// Issue id.
        id: u64,
    },

    /// List time entry activities.
    Activities,

    /// Log a fixed amount of time on an issue.
    Log {
        /// Issue id.
        issue: u64,

        /// Minutes spent.
        #[arg(short, long)]
        minutes: u64,

        /// Activity id (default activity if omitted).
        #[arg(short, long)]
        activity: Option<u64>,

        /// Comment for the time entry.
        #[arg(short, long, default_value = "")]
        comment: String,

        /// Date the time was spent (YYYY-MM-DD, defaults to today).
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Interactive session with live search and a work timer.
    Session,

    /// Show configuration file paths.
    Paths,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
