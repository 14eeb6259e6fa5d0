use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::{ServiceConfig, DEFAULT_DB_FILE, DEFAULT_MAX_TASKS};

/// Simple, file-backed task tracker.
/// Storage defaults to ./tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tt", version, about = "File-backed task tracker")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    pub db: PathBuf,

    /// Maximum number of tasks the store accepts.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TASKS)]
    pub max_tasks: usize,

    /// Do not save after every change; changes are written on exit.
    #[arg(long, global = true)]
    pub no_auto_save: bool,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Service options selected by the global flags.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            path: self.db.clone(),
            max_tasks: self.max_tasks,
            auto_save: !self.no_auto_save,
        }
    }
}
