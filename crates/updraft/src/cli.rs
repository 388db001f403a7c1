use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Answer desktop auto-updater queries from a repository's GitHub releases.
///
/// The repository is configured through `ACCOUNT`, `REPOSITORY`, `TOKEN`,
/// `URL`, `PRE`, `INTERVAL` and `API_URL`.
#[derive(Debug, Parser)]
#[command(name = "updraft", version, about)]
pub struct Cli {
    /// Log at debug level, overriding `--log-level`.
    #[arg(long, global = true)]
    pub debug: bool,

    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Upstream request timeout in seconds.
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the latest release.
    Version,

    /// Decide whether a client should update.
    Check {
        /// Platform token as sent by the client (`dmg`, `mac`, `win32`, ...).
        platform: String,
        /// Version the client is running.
        version: String,
    },

    /// Run a route and print the response.
    Get {
        /// Request path with an optional query, e.g. `/update/dmg/2.0.0`.
        path: String,

        #[arg(long)]
        user_agent: Option<String>,
    },
}
