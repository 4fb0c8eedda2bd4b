//! redtime - search Redmine issues and track work time from the terminal.
//!
//! Stores Redmine credentials once, then offers one-shot commands and an
//! interactive session with debounced live search and a work timer whose
//! elapsed time can be committed as a time entry.
//!
//! QUICK START:
//!   redtime config --url https://redmine.example.com --username me --password ...
//!   redtime search                      # My open issues
//!   redtime search "login"              # Subject search
//!   redtime log 42 --minutes 30         # Log time on #42
//!   redtime session                     # Live search + timer

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_activities, format_outcome, format_timer, test_login, CommitRequest, Navigator,
    OutputFormat, SessionRuntime,
};
use cli::{Cli, Commands, SessionCommand, SESSION_HELP};
use domain::{AppConfig, AppError, Credentials};
use infrastructure::{
    clear_credentials, config_file_path, ensure_config_exists, load_config, save_credentials,
    FileConnector,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;

    ensure_config_exists()?;
    let config = load_config()?;

    match cli.command {
        Commands::Config {
            url,
            username,
            password,
            password_confirm,
            no_test,
        } => {
            let confirm = password_confirm.unwrap_or_else(|| password.clone());
            let credentials = Credentials {
                url,
                username,
                password,
            };
            cmd_config(&config, &credentials, &confirm, no_test).await?;
        }
        Commands::Logout => {
            clear_credentials(&config.credentials_file_path())?;
            println!("{} Credentials removed", "✓".green().bold());
        }
        Commands::Search { text } => {
            cmd_search(&config, &text, format).await?;
        }
        Commands::Describe { id } => {
            let runtime = open_session(&config);
            let description = runtime.describe(id).await?;
            if description.is_empty() {
                println!("{}", "No description".dimmed());
            } else {
                println!("{description}");
            }
        }
        Commands::Activities => {
            let runtime = open_session(&config);
            println!("{}", format_activities(&runtime.activities().await?));
        }
        Commands::Log {
            issue,
            minutes,
            activity,
            comment,
            date,
        } => {
            let runtime = open_session(&config);
            runtime.set_minutes(minutes).await?;
            let request = CommitRequest {
                issue_id: issue,
                activity_id: activity,
                comments: comment,
                spent_on: date,
            };
            let entry = runtime.commit(request).await?;
            println!(
                "{} Logged {:.2}h on #{}",
                "✓".green().bold(),
                entry.hours,
                entry.issue_id
            );
        }
        Commands::Session => {
            cmd_session(&config, format).await?;
        }
        Commands::Paths => {
            println!("{}", "📂 redtime paths".bold());
            println!("  config:      {}", config_file_path().display());
            println!("  credentials: {}", config.credentials_file_path().display());
        }
    }

    Ok(())
}

/// Prints where to go when Redmine is not configured.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to_config(&self, reason: &str) {
        eprintln!(
            "{} {reason}. Run `redtime config --url <url> --username <user> --password <pass>`.",
            "!".yellow().bold()
        );
    }
}

fn connector(config: &AppConfig) -> FileConnector {
    FileConnector::new(config.credentials_file_path(), config.request_timeout())
}

fn open_session(config: &AppConfig) -> SessionRuntime {
    SessionRuntime::start(
        &config.session,
        Arc::new(connector(config)),
        Arc::new(ConsoleNavigator),
    )
}

/// Validate, probe and store credentials.
async fn cmd_config(
    config: &AppConfig,
    credentials: &Credentials,
    confirm: &str,
    no_test: bool,
) -> domain::Result<()> {
    credentials.validate(confirm)?;

    if !no_test {
        println!("Testing connection to {}...", credentials.url.cyan());
        test_login(&connector(config), credentials).await?;
        println!("{} Login succeeded", "✓".green().bold());
    }

    save_credentials(&config.credentials_file_path(), credentials)?;
    println!(
        "{} Saved credentials to {}",
        "✓".green().bold(),
        config.credentials_file_path().display()
    );
    Ok(())
}

/// One-shot search.
async fn cmd_search(config: &AppConfig, text: &str, format: OutputFormat) -> domain::Result<()> {
    let runtime = open_session(config);
    let outcome = runtime.search_now(text).await?;
    println!(
        "{}",
        format_outcome(&outcome, format).map_err(AppError::json_parse)?
    );
    Ok(())
}

/// Interactive session reading commands from stdin.
async fn cmd_session(config: &AppConfig, format: OutputFormat) -> domain::Result<()> {
    let runtime = open_session(config);
    let mut results = runtime.search().results();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{SESSION_HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| AppError::io("Failed to read input", e))?;
                let Some(line) = line else { break };
                match SessionCommand::parse(line.trim_end()) {
                    Ok(SessionCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = handle_command(&runtime, command).await {
                            eprintln!("{} {}", "Error:".red().bold(), e);
                        }
                    }
                    Err(usage) => eprintln!("{}", usage.yellow()),
                }
            }
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let outcome = results.borrow_and_update().clone();
                if let Some(outcome) = outcome {
                    println!(
                        "{}",
                        format_outcome(&outcome, format).map_err(AppError::json_parse)?
                    );
                }
            }
        }
    }

    let secs = runtime.timer().elapsed_secs();
    if secs > 0 {
        println!("Uncommitted time: {}", format_timer(secs, false));
    }
    Ok(())
}

/// Apply one session command.
async fn handle_command(runtime: &SessionRuntime, command: SessionCommand) -> domain::Result<()> {
    let timer = runtime.timer();
    match command {
        SessionCommand::Search(text) => runtime.search().set_text(text),
        SessionCommand::Again => runtime.search().search_again(),
        SessionCommand::Clear => runtime.search().clear(),
        SessionCommand::Start
        | SessionCommand::Stop
        | SessionCommand::Set(_)
        | SessionCommand::Subtract(_)
        | SessionCommand::Time => {
            let state = match command {
                SessionCommand::Start => timer.start().await,
                SessionCommand::Stop => timer.stop().await,
                SessionCommand::Set(value) => timer.set_duration(value).await,
                SessionCommand::Subtract(amount) => timer.subtract(amount).await,
                _ => timer.state(),
            };
            println!("{}", format_timer(timer.elapsed_secs(), state.running));
        }
        SessionCommand::Status => {
            let search = runtime.search();
            let connection = if runtime.is_configured() {
                "connected".green()
            } else {
                "not configured".red()
            };
            println!("Redmine: {connection}");
            match search.issues() {
                Some(issues) => println!("Search:  {} issue(s)", issues.len()),
                None if !search.error().is_empty() => {
                    println!("Search:  {}", search.error().red());
                }
                None => println!("Search:  {}", "pending".dimmed()),
            }
            if search.show_cancel() {
                println!("         {}", ":clear resets the search text".dimmed());
            }
            let shown = *timer.running_time().borrow();
            println!("Timer:   {}", format_timer(shown, timer.is_running()));
        }
        SessionCommand::Refresh => {
            if runtime.refresh() {
                println!("{} Reconnected", "✓".green().bold());
            }
        }
        SessionCommand::Describe(id) => {
            let description = runtime.describe(id).await?;
            if description.is_empty() {
                println!("{}", "No description".dimmed());
            } else {
                println!("{description}");
            }
        }
        SessionCommand::Activities => {
            println!("{}", format_activities(&runtime.activities().await?));
        }
        SessionCommand::Commit {
            issue_id,
            activity_id,
            comments,
        } => {
            let entry = runtime
                .commit(CommitRequest {
                    issue_id,
                    activity_id,
                    comments,
                    spent_on: None,
                })
                .await?;
            println!(
                "{} Logged {:.2}h on #{}",
                "✓".green().bold(),
                entry.hours,
                entry.issue_id
            );
            timer.set_duration(Duration::ZERO).await;
        }
        SessionCommand::Help => println!("{SESSION_HELP}"),
        SessionCommand::Quit => {}
    }
    Ok(())
}

/// Setup logging with tracing-subscriber.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
