use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_INTERVAL_SECS;

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $NOTIPOLL_CONFIG
  3) platform default, e.g. ~/.config/notipoll/config.yaml
"#;

#[derive(Debug, Parser)]
#[command(
    name = "notipoll",
    version,
    about = "Shows desktop popups for unnotified records of a notifications service",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Optional subcommand. Without one, monitors until interrupted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll once, show whatever is pending and report what happened
    Test,
    /// Interactive session: start/stop/test the monitor and inspect history
    Console,
    /// Write a config file
    Init {
        /// Service base URL (e.g., https://notify.example.com)
        #[arg(long)]
        domain: String,
        /// Only show records of this project
        #[arg(long, default_value = "")]
        project: String,
        /// Poll interval in seconds (1-3600)
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, allow_negative_numbers = true)]
        interval: i64,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
