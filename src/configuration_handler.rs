use crate::{
    configuration::{Configuration, DEFAULT_INTERVAL_MINUTES},
    types::SlotView,
};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "meeting_scheduler", about = "Meeting slot scheduler")]
pub struct ConfigurationHandler {
    /// Slot length in minutes
    #[arg(
        long,
        env = "SCHEDULER_INTERVAL_MINUTES",
        default_value_t = DEFAULT_INTERVAL_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..=1440)
    )]
    interval_minutes: u32,

    /// PostgreSQL connection string. Takes precedence over --store-file
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON file keeping the slots when no database is configured
    #[arg(long, env = "SCHEDULER_STORE_FILE")]
    store_file: Option<PathBuf>,

    /// Require school and id number on every booking
    #[arg(
        long,
        env = "SCHEDULER_REQUIRE_IDENTITY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    require_identity: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split the availability windows of a JSON file into slots
    Submit { file: PathBuf },
    /// Book a slot from a JSON booking request
    Book { file: PathBuf },
    /// Release a booked slot
    Cancel { display_id: String },
    /// Print slots in display order
    List {
        #[arg(value_enum, default_value_t = SlotView::All)]
        view: SlotView,
    },
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(?err, "Failed to load .env file");
            }
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    fn require_identity(&self) -> bool {
        self.require_identity
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn store_file(&self) -> Option<PathBuf> {
        self.store_file.clone()
    }
}
