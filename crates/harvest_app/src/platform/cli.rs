use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use super::logging::LogDestination;

/// Collects every message of a WhatsApp Web account into one CSV file.
#[derive(Debug, Parser)]
#[command(name = "harvest", version, about)]
pub struct Cli {
    /// RON settings file. Defaults to ./harvest.ron when it exists.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Export name, without the .csv extension. Asked for interactively when absent.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Persistent browser profile; keeps the login between runs.
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Maximum number of conversations to harvest.
    #[arg(short, long)]
    pub quota: Option<usize>,

    /// Conversation title to skip. Repeatable; added to the configured list.
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Vec<String>,

    /// Stop the whole run after this many minutes.
    #[arg(long)]
    pub deadline_mins: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogDestination::Both)]
    pub log_to: LogDestination,
}

impl Cli {
    /// Run deadline from `--deadline-mins`; absurdly large values saturate.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_mins
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
