//! Options consumed by the task service.

use std::path::PathBuf;

/// Default storage file, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "tasks.json";

/// Default upper bound on the number of stored tasks.
pub const DEFAULT_MAX_TASKS: usize = 1000;

/// Service configuration: where tasks are persisted, how many may be held,
/// and whether each mutation is saved immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub path: PathBuf,
    pub max_tasks: usize,
    pub auto_save: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            path: PathBuf::from(DEFAULT_DB_FILE),
            max_tasks: DEFAULT_MAX_TASKS,
            auto_save: true,
        }
    }
}

impl ServiceConfig {
    /// Default configuration persisting to `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        ServiceConfig {
            path: path.into(),
            ..Default::default()
        }
    }
}
