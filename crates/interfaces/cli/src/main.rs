use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nestbot_config::{AppConfig, DEFAULT_CONFIG_PATH};
use nestbot_core::markdown::to_plain;
use nestbot_core::{GreetingKind, due_greetings, render};
use nestbot_store::Roster;

#[derive(Debug, Parser)]
#[command(
    name = "nestbot",
    version,
    about = "Birthday and milestone bot for a parents' group chat"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Connect to Telegram and run until interrupted.
    Run,
    /// Print the children list with current ages.
    Roster,
    /// Print upcoming birthdays and events.
    Upcoming,
    /// Preview the congratulations the daily pass would send.
    Check {
        /// Day to check (YYYY-MM-DD); defaults to today in the configured timezone.
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// Write the default config file if it does not exist yet.
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!(config = %cli.config.display(), "starting nestbot");
            nestbot_telegram::start_bot(config).await?;
        }
        Commands::Roster => {
            let roster = open_roster(&config);
            println!("{}", to_plain(&render::children_list(roster.children(), today(&config))));
        }
        Commands::Upcoming => {
            let roster = open_roster(&config);
            let today = today(&config);
            println!(
                "{}",
                to_plain(&render::birthdays(
                    roster.children(),
                    today,
                    config.views.birthday_window_days
                ))
            );
            println!();
            println!(
                "{}",
                to_plain(&render::calendar(
                    roster.events(),
                    today,
                    config.views.event_window_days
                ))
            );
        }
        Commands::Check { date } => {
            let roster = open_roster(&config);
            let day = date.unwrap_or_else(|| today(&config));
            let due = due_greetings(roster.children(), day);
            if due.is_empty() {
                println!("nothing due on {day}");
            }
            for greeting in due {
                let kind = match greeting.kind {
                    GreetingKind::Birthday { .. } => "birthday",
                    GreetingKind::Month { .. } => "month",
                    GreetingKind::Year { .. } => "year",
                };
                println!("── {kind} ({}) ──", greeting.key);
                println!("{}", to_plain(&greeting.text));
            }
        }
        Commands::InitConfig => init_config(&cli.config)?,
    }

    Ok(())
}

fn open_roster(config: &AppConfig) -> Roster {
    Roster::open(config.storage.children_path(), config.storage.events_path())
}

fn today(config: &AppConfig) -> NaiveDate {
    Utc::now()
        .with_timezone(&config.schedule.tz())
        .date_naive()
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} already exists; leaving it untouched", path.display());
        return Ok(());
    }
    AppConfig::default().save_to(path)?;
    println!("wrote default config to {}", path.display());
    Ok(())
}
