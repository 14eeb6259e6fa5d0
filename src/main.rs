//! # tt - file-backed task tracker
//!
//! A command-line task tracker with validated create/update/delete,
//! filtered queries, statistics and an optional terminal user interface
//! (TUI). The whole collection lives in one JSON file, rewritten after
//! every change unless `--no-auto-save` is given.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! tt add "Prepare release notes" --priority high --due tomorrow --assignee sam
//!
//! # List open work for one person
//! tt list --assignee sam --status in-progress
//!
//! # Overdue tasks and a summary
//! tt list --overdue
//! tt stats
//!
//! # Interactive UI
//! tt ui
//! ```
//!
//! Tasks are stored in `./tasks.json` unless `--db <path>` is given.
//! Diagnostics go to stderr; raise verbosity with `--log-level debug` or `RUST_LOG`.

use clap::Parser;
use tracing::warn;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod logging;
pub mod service;
pub mod stats;
pub mod storage;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use service::TaskService;

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    // Completions never touch the task file
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let config = cli.service_config();
    let Some(mut service) = TaskService::open(config.clone()) else {
        eprintln!(
            "error: could not load tasks from {}; fix or move the file and retry",
            config.path.display()
        );
        std::process::exit(1);
    };
    let skipped = service.last_load_skipped();
    if skipped > 0 {
        eprintln!("Warning: skipped {skipped} unreadable record(s) in {}", config.path.display());
    }

    let result = match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Ui => cmd_ui(&mut service),

        Commands::Add { title, desc, assignee, tags, priority, status, due, estimate, actual } =>
            cmd_add(&mut service, title, TaskEdits {
                desc,
                assignee,
                tags,
                priority: Some(priority),
                status: Some(status),
                due,
                estimate,
                actual: Some(actual),
                ..Default::default()
            }),

        Commands::List { status, priority, assignee, overdue, limit } =>
            cmd_list(&service, status, priority, assignee, overdue, limit),

        Commands::View { id } => cmd_view(&service, id),

        Commands::Update { id, title, desc, assignee, tags, priority, status, due, clear_due,
                           estimate, clear_estimate, actual } =>
            cmd_update(&mut service, id, TaskEdits {
                title, desc, assignee, tags, priority, status, due, clear_due,
                estimate, clear_estimate, actual,
            }),

        Commands::Delete { id } => cmd_delete(&mut service, id),

        Commands::Search { query } => cmd_search(&service, query),

        Commands::Stats => cmd_stats(&service),

        Commands::Save => cmd_save(&mut service),
    };

    if !service.close() {
        warn!(path = %config.path.display(), "unsaved changes were lost on exit");
        eprintln!("error: failed to save tasks to {}", config.path.display());
        std::process::exit(1);
    }

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
