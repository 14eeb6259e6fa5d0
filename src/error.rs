//! Error types for task operations and persistence.

use std::path::PathBuf;

use uuid::Uuid;

/// Errors raised synchronously by service operations, always before any mutation.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Caller-supplied data violates a precondition.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A task with this id is already stored.
    #[error("task {0} already exists")]
    Duplicate(Uuid),

    /// The store already holds the configured maximum number of tasks.
    #[error("task limit reached ({max} tasks)")]
    Capacity {
        /// Configured maximum.
        max: usize,
    },
}

/// Failures inside the storage adapter. These never cross the adapter
/// boundary as errors; they are logged and reported as a failed save/load.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or renaming the backing file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but does not have the expected shape.
    #[error("unexpected file format: {0}")]
    Format(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_display() {
        let err = TaskError::Capacity { max: 100 };
        assert_eq!(err.to_string(), "task limit reached (100 tasks)");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = StorageError::io(
            "/tmp/tasks.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/tasks.json"));
        assert!(msg.contains("denied"));
    }
}
